use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Input the screener loop reacts to
#[derive(Clone, Debug)]
pub enum ScreenEvent {
    Key(KeyEvent),
    Resize,
    /// No input within the tick interval
    Tick,
}

/// Source of terminal events
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout`; `Err(Timeout)` if nothing arrived.
    fn recv_timeout(&self, timeout: Duration) -> Result<ScreenEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread and forwards them over a channel.
/// Key releases are dropped so one physical press yields one response.
pub struct CrosstermEventSource {
    rx: Receiver<ScreenEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    Some(ScreenEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => Some(ScreenEvent::Resize),
                Ok(_) => None,
                Err(e) => {
                    tracing::error!(error = %e, "terminal event reader stopped");
                    break;
                }
            };

            if let Some(ev) = forwarded {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ScreenEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed source for headless tests
pub struct ChannelEventSource {
    rx: Receiver<ScreenEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<ScreenEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ScreenEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Hands the loop one event at a time, or `Tick` when the interval passes quietly
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn step(&self) -> ScreenEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                ScreenEvent::Tick
            }
        }
    }
}
