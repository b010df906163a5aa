mod app;
mod dialog;
mod model;
mod msg;
mod prompt;
mod watch;

use std::io;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use crossterm::event::{self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use app::App;
use dialog::TerminalPrompter;
use model::config::AppConfig;
use model::manager::SettingsManager;
use model::snapshot::SnapshotStore;
use msg::Msg;
use watch::DirWatcher;

fn main() -> Result<()> {
    // Initialize logging to file (never stdout)
    let log_dir = directories::ProjectDirs::from("", "", "standard-switcher")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("standard-switcher"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "standard-switcher.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "standard_switcher=info".into()),
        )
        .with_ansi(false)
        .init();

    tracing::info!("standard-switcher starting");

    let config = AppConfig::load()?;
    let store = SnapshotStore::new(config.switcher_folder());
    let manager = SettingsManager::initialize(store).context("preparing switcher folder")?;
    tracing::info!(folder = %manager.store().dir().display(), "switcher folder ready");

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, config, manager);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!("fatal: {e:?}");
        eprintln!("standard-switcher error: {e:?}");
    }

    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: AppConfig,
    manager: SettingsManager,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Msg>();
    let tick = config.tick_interval();
    let mut app = App::new(config, manager);

    // Input thread — reads terminal events and forwards as Msg
    let tx_input = tx.clone();
    thread::spawn(move || {
        loop {
            let msg = match event::read() {
                Ok(Event::Key(k)) if k.kind != KeyEventKind::Release => Msg::Key(k),
                Ok(Event::Resize(..)) => Msg::Resize,
                Ok(Event::FocusGained) => Msg::FocusGained,
                Ok(_) => continue,
                Err(err) => {
                    tracing::error!("terminal input failed: {err}");
                    let _ = tx_input.send(Msg::Quit);
                    break;
                }
            };
            if tx_input.send(msg).is_err() {
                break;
            }
        }
    });

    // Tick thread — flushes debounced reloads
    let tx_tick = tx.clone();
    thread::spawn(move || {
        loop {
            thread::sleep(tick);
            if tx_tick.send(Msg::Tick).is_err() {
                break;
            }
        }
    });

    // File watcher — emits FileChanged for create/modify/remove events.
    // Re-synced every batch so folders created later get watched.
    let mut watcher = match DirWatcher::new(tx.clone()) {
        Ok(w) => Some(w),
        Err(err) => {
            tracing::warn!("failed to initialize file watcher: {err}");
            None
        }
    };
    if let Some(w) = watcher.as_mut() {
        w.sync(&app.watched_dirs());
    }

    terminal.draw(|f| app.view(f))?;

    // ── Main event loop ──
    loop {
        // Batch-drain all pending messages
        let first = rx.recv()?;
        app.update(first);

        while let Ok(msg) = rx.try_recv() {
            app.update(msg);
        }

        if app.should_quit {
            break;
        }

        if let Some(action) = app.take_pending_action() {
            let mut prompter = TerminalPrompter::new(terminal, &rx, app.panel_view());
            app.run_action(action, &mut prompter);
            // Hooks that fired while the dialog was open.
            for msg in prompter.into_deferred() {
                app.update(msg);
            }
            if app.should_quit {
                break;
            }
        }

        if let Some(w) = watcher.as_mut() {
            w.sync(&app.watched_dirs());
        }

        terminal.draw(|f| app.view(f))?;
    }

    tracing::info!("standard-switcher exiting");
    Ok(())
}
