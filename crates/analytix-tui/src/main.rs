use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use ratatui::Terminal;
use ratatui::crossterm::event;
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::CrosstermBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use analytix_core::{AnalysisController, Session};

mod action;
mod app;
mod backend;
mod config;
mod input;
mod model;
mod theme;
mod tui_event;
mod view;

use app::App;

/// AnalytiX Hub TUI - sign in, create analyses and watch runs in the terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ~/.config/analytix/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Key-value store file for logins and recent analyses
    #[arg(long)]
    store: Option<PathBuf>,

    /// Directory exports are written to
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Log file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_path = args.log_file.clone().unwrap_or_else(config::default_log_path);
    init_logging(&log_path)?;

    // Resolve config from CLI flags > env vars > config file > defaults
    let config_file = args.config.clone().or_else(config::config_path);
    let mut config = config::resolve(config_file.as_deref(), |key| std::env::var(key).ok())?;
    if let Some(store) = args.store {
        config.store_path = Some(store);
    }
    if let Some(dir) = args.export_dir {
        config.export_dir = Some(dir);
    }

    let store_path = config
        .store_path
        .clone()
        .unwrap_or_else(config::default_store_path);
    let store = backend::open_store(&store_path)?;
    let export_dir = config
        .export_dir
        .clone()
        .unwrap_or_else(config::default_export_dir);
    log::info!(
        "starting with store {} and exports in {}",
        store_path.display(),
        export_dir.display()
    );

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Install panic hook that restores terminal before printing panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Drain any stray input events (e.g. Enter keypress from launching the command)
    while event::poll(Duration::from_millis(50)).unwrap_or(false) {
        let _ = event::read();
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let controller = AnalysisController::new(config.timing.clone());
    let forwarder = backend::forward_snapshots(&controller, tx.clone(), cancel.clone());
    let mut app = App::new(Session::new(store), controller, export_dir, tx);

    // Also handle Ctrl+C at the OS level for clean shutdown
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_for_signal.cancel();
        }
    });

    // Short enough to animate the progress ramp.
    let tick_rate = Duration::from_millis(50);

    loop {
        terminal.draw(|f| app.view(f))?;

        tokio::select! {
            maybe_event = rx.recv() => {
                if let Some(backend_event) = maybe_event {
                    app.handle_backend_event(backend_event);
                    // Drain any additional queued backend events
                    while let Ok(evt) = rx.try_recv() {
                        app.handle_backend_event(evt);
                    }
                }
            }
            _ = cancel.cancelled() => {
                app.should_quit = true;
            }
            _ = async {
                if event::poll(tick_rate).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        let action = input::map_event(&evt, app.is_editing());
                        app.update(action);
                    }
                }
            } => {}
        }

        app.update(action::Action::Tick);

        if app.should_quit {
            cancel.cancel();
            break;
        }
    }

    let _ = forwarder.await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}
