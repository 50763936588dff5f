use std::{
    fs::{self, OpenOptions},
    io::{self, stdin},
    sync::Mutex,
    time::Duration,
};

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reflex::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, RoundSettings},
    round::RoundMachine,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    store::{KeyValueStore, MemoryStore, SqliteStore},
};

/// reaction time tui: wait for green, hit space, track your best
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A reaction time game for the terminal. Start a round, wait for the arena to turn green, then press space, enter or click as fast as you can. Session stats and your all-time best are tracked."
)]
pub struct Cli {
    /// shortest wait before the cue, in milliseconds
    #[clap(long = "min-delay")]
    min_delay_ms: Option<u64>,

    /// longest wait before the cue, in milliseconds
    #[clap(long = "max-delay")]
    max_delay_ms: Option<u64>,

    /// reactions slower than this many milliseconds are discarded
    #[clap(long = "max-reaction")]
    max_reaction_ms: Option<u64>,

    /// redraw interval in milliseconds
    #[clap(long = "tick-rate")]
    tick_rate_ms: Option<u64>,

    /// calmer arena animation
    #[clap(long)]
    reduced_motion: bool,

    /// keep the best time in memory only
    #[clap(long)]
    ephemeral: bool,

    /// seed for the cue delay generator (reproducible rounds)
    #[clap(long)]
    seed: Option<u64>,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Overlay command line flags on the persisted config
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(ms) = self.min_delay_ms {
            cfg.min_delay_ms = ms;
        }
        if let Some(ms) = self.max_delay_ms {
            cfg.max_delay_ms = ms;
        }
        if let Some(ms) = self.max_reaction_ms {
            cfg.max_reaction_ms = ms;
        }
        if let Some(ms) = self.tick_rate_ms {
            cfg.tick_rate_ms = ms;
        }
        if self.reduced_motion {
            cfg.reduced_motion = true;
        }
        cfg
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_file = AppDirs::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()?;
        Some((path, file))
    });

    match log_file {
        Some((path, file)) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .init();
            info!(path = %path.display(), "logging initialized");
        }
        // The TUI owns stdout/stderr; no log file means no logs.
        None => tracing_subscriber::registry().with(env_filter).init(),
    }
}

fn open_store(ephemeral: bool) -> Box<dyn KeyValueStore> {
    if ephemeral {
        return Box::new(MemoryStore::new());
    }
    let Some(path) = AppDirs::db_path() else {
        warn!("no state directory, best time will not persist");
        return Box::new(MemoryStore::new());
    };
    match SqliteStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot open stats db, best time will not persist");
            Box::new(MemoryStore::new())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_tracing();

    let config_store = FileConfigStore::new();
    let cfg = cli.apply(config_store.load());
    if let Err(err) = cfg.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, err).exit();
    }
    if cli.save_config {
        config_store
            .save(&cfg)
            .with_context(|| format!("saving config to {}", config_store.path().display()))?;
    }
    let settings = RoundSettings::try_from(&cfg)?;

    let mut machine = RoundMachine::new(open_store(cli.ephemeral), settings);
    if let Some(seed) = cli.seed {
        machine = machine.with_seed(seed);
    }

    // Without release events a held key is indistinguishable from fresh presses,
    // so ask for event types where the terminal supports it.
    let reports_release = supports_keyboard_enhancement().unwrap_or(false);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    if reports_release {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(machine, cfg.reduced_motion, reports_release);
    info!(?settings, reports_release, "starting");
    let result = run(&mut terminal, &mut app, Duration::from_millis(cfg.tick_rate_ms));

    if reports_release {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<Box<dyn KeyValueStore>>,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick_rate));

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    while !app.should_quit {
        let event = runner.step_within(app.machine.time_until_cue());
        if app.handle_event(event) {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    Ok(())
}
