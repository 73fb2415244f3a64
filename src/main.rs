use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs,
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use stroop_screen::{
    app::{Action, App},
    app_dirs::AppDirs,
    classifier::{LogisticModel, RiskClassifier, UnavailableClassifier},
    config::{Config, ConfigStore, FileConfigStore},
    palette::ColorName,
    runtime::{CrosstermEventSource, EventSource, FixedTicker, Runner, ScreenEvent, Ticker},
    TICK_RATE_MS,
};
use tracing_subscriber::EnvFilter;

/// stroop color-word test with reaction-time scoring and a cognitive risk estimate
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Administers a Stroop test in the terminal, scores accuracy and reaction time, and feeds the result together with the subject's age to a trained risk model. For educational use only; not a medical diagnosis."
)]
pub struct Cli {
    /// number of trials in a session
    #[clap(short = 'n', long)]
    trials: Option<usize>,

    /// colors to draw words and inks from, comma separated
    #[clap(long, value_enum, value_delimiter = ',')]
    palette: Option<Vec<ColorName>>,

    /// youngest accepted subject age
    #[clap(long)]
    min_age: Option<u32>,

    /// oldest accepted subject age
    #[clap(long)]
    max_age: Option<u32>,

    /// path to the trained model artifact (json)
    #[clap(short = 'm', long)]
    model: Option<PathBuf>,

    /// directory csv exports are written to
    #[clap(long)]
    export_dir: Option<PathBuf>,

    /// seed for reproducible trial sequences
    #[clap(long)]
    seed: Option<u64>,

    /// blank interval shown before each stimulus, in milliseconds
    #[clap(long)]
    fixation_ms: Option<u64>,

    /// persist the effective settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Overlay command-line flags on top of the stored configuration
    fn apply_to(&self, mut cfg: Config) -> Config {
        if let Some(n) = self.trials {
            cfg.number_of_trials = n;
        }
        if let Some(palette) = &self.palette {
            cfg.palette = palette.clone();
        }
        if let Some(min_age) = self.min_age {
            cfg.min_age = min_age;
        }
        if let Some(max_age) = self.max_age {
            cfg.max_age = max_age;
        }
        if let Some(model) = &self.model {
            cfg.model_path = Some(model.clone());
        }
        if let Some(dir) = &self.export_dir {
            cfg.export_dir = Some(dir.clone());
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if let Some(ms) = self.fixation_ms {
            cfg.fixation_ms = ms;
        }
        cfg
    }
}

fn init_logging() -> io::Result<()> {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_env("STROOP_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_classifier(cfg: &Config) -> Box<dyn RiskClassifier> {
    match LogisticModel::load(cfg.model_path()) {
        Ok(model) => Box::new(model),
        Err(e) => {
            tracing::warn!(error = %e, "continuing without a risk model");
            Box::new(UnavailableClassifier::new(e.to_string()))
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let config = cli.apply_to(store.load());
    if let Err(e) = config.validate() {
        Cli::command().error(ErrorKind::InvalidValue, e).exit();
    }
    if cli.save_config {
        store.save(&config)?;
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(e) = init_logging() {
        eprintln!("logging disabled: {e}");
    }
    tracing::info!(?config, "starting stroop screener");

    let classifier = load_classifier(&config);
    let mut app = App::new(config, classifier);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = run(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match runner.step() {
            ScreenEvent::Tick => {
                let was_fixating = app.in_fixation();
                app.on_tick(Instant::now());
                if was_fixating && !app.in_fixation() {
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
            ScreenEvent::Resize => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            ScreenEvent::Key(key) => {
                if app.handle_key(key, Instant::now()) == Action::Quit {
                    break;
                }
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
        }
    }

    tracing::info!("stroop screener exiting");
    Ok(())
}
