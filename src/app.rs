//! Terminal presentation adapter: turns key presses and ticks into state-machine calls.
//!
//! All methods take the current `Instant` from the caller so reaction times can be driven
//! deterministically in tests.

use crate::classifier::RiskClassifier;
use crate::config::Config;
use crate::error::Error;
use crate::export;
use crate::palette::color_for_key;
use crate::stroop::{Assessment, StroopTest, Submission};
use crate::session::Stage;
use crate::trial_generator::TrialGenerator;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const MAX_AGE_DIGITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Outcome of scoring a finished session
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Assessed(Assessment),
    /// The model could not be consulted; the summary is still shown
    ClassifierUnavailable(String),
    Failed(String),
}

pub struct App {
    pub config: Config,
    pub test: StroopTest,
    classifier: Box<dyn RiskClassifier>,
    pub age_input: String,
    pub message: Option<String>,
    pub verdict: Option<Verdict>,
    pub last_export: Option<PathBuf>,
    reveal_at: Option<Instant>,
}

impl App {
    pub fn new(config: Config, classifier: Box<dyn RiskClassifier>) -> Self {
        let test = StroopTest::new(
            config.age_range(),
            TrialGenerator::from_seed_option(config.seed),
        );
        Self {
            config,
            test,
            classifier,
            age_input: String::new(),
            message: None,
            verdict: None,
            last_export: None,
            reveal_at: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.test.stage()
    }

    /// True while the fixation cross is up and the stimulus is hidden
    pub fn in_fixation(&self) -> bool {
        self.stage() == Stage::Running && !self.test.is_presented()
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Action {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Action::Quit;
        }

        match self.stage() {
            Stage::Instructions => self.on_instructions_key(key, now),
            Stage::Running => self.on_trial_key(key, now),
            Stage::Finished => self.on_results_key(key),
        }

        Action::Continue
    }

    /// Reveal the pending stimulus once its fixation interval has passed
    pub fn on_tick(&mut self, now: Instant) {
        if let Some(at) = self.reveal_at {
            if now >= at {
                self.reveal(now);
            }
        }
    }

    fn on_instructions_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.age_input.len() < MAX_AGE_DIGITS {
                    self.age_input.push(c);
                }
                self.message = None;
            }
            KeyCode::Backspace => {
                self.age_input.pop();
                self.message = None;
            }
            KeyCode::Enter => self.begin(now),
            KeyCode::Char('r') => self.restart(),
            _ => {}
        }
    }

    fn begin(&mut self, now: Instant) {
        let age = match self.age_input.parse::<u32>() {
            Ok(age) => age,
            Err(_) => {
                self.message = Some("Enter your age first".to_string());
                return;
            }
        };

        let palette = self.config.palette.clone();
        match self.test.start(age, self.config.number_of_trials, &palette) {
            Ok(()) => {
                self.message = None;
                self.verdict = None;
                self.last_export = None;
                self.schedule_reveal(now);
            }
            Err(Error::InvalidInput(_)) => {
                let range = self.test.age_range();
                self.message = Some(format!(
                    "Age must be between {} and {}",
                    range.start(),
                    range.end()
                ));
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    fn on_trial_key(&mut self, key: KeyEvent, now: Instant) {
        let KeyCode::Char(c) = key.code else {
            return;
        };
        if c == 'r' {
            tracing::info!(
                answered = self.test.session().responses().len(),
                "session abandoned"
            );
            self.restart();
            return;
        }
        let Some(chosen) = color_for_key(&self.config.palette, c) else {
            return;
        };
        if !self.test.is_presented() {
            // stimulus not on screen yet
            return;
        }

        let index = self.test.session().current_index();
        match self.test.submit_at(index, chosen, now) {
            Ok(Submission::Accepted { finished: true, .. }) => self.finish(),
            Ok(Submission::Accepted { .. }) => self.schedule_reveal(now),
            Ok(Submission::Duplicate) => {}
            Err(e) => {
                tracing::warn!(error = %e, "response rejected");
                self.message = Some(e.to_string());
            }
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => self.restart(),
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
    }

    fn schedule_reveal(&mut self, now: Instant) {
        if self.config.fixation_ms == 0 {
            self.reveal(now);
        } else {
            self.reveal_at = Some(now + Duration::from_millis(self.config.fixation_ms));
        }
    }

    fn reveal(&mut self, now: Instant) {
        self.reveal_at = None;
        if let Err(e) = self.test.mark_presented(now) {
            tracing::warn!(error = %e, "could not present stimulus");
        }
    }

    fn finish(&mut self) {
        self.reveal_at = None;
        let verdict = match self.test.assess(self.classifier.as_ref()) {
            Ok(assessment) => Verdict::Assessed(assessment),
            Err(Error::ClassifierUnavailable(reason)) => {
                tracing::warn!(%reason, "risk classifier unavailable");
                Verdict::ClassifierUnavailable(reason)
            }
            Err(e) => {
                tracing::error!(error = %e, "assessment failed");
                Verdict::Failed(e.to_string())
            }
        };
        self.verdict = Some(verdict);
    }

    pub fn restart(&mut self) {
        self.test.restart();
        self.age_input.clear();
        self.message = None;
        self.verdict = None;
        self.last_export = None;
        self.reveal_at = None;
    }

    pub fn export(&mut self) {
        match export::export_to_dir(self.config.export_dir(), self.test.session().responses()) {
            Ok(path) => {
                self.message = Some(format!("Saved {}", path.display()));
                self.last_export = Some(path);
            }
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                self.message = Some(format!("Export failed: {e}"));
            }
        }
    }
}
