//! Habit Tracker - Track daily habits with streaks and analytics.

mod app;
mod config;
mod ui;

use app::App;
use config::Config;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use habit_core::Day;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "HABIT_TRACKER_LOG";

/// How often the day rollover is checked while idle.
const TICK_RATE: Duration = Duration::from_secs(1);

/// Log to a file in the data directory; stdout belongs to the terminal UI.
fn init_tracing() -> anyhow::Result<()> {
    let Some(path) = Config::log_path() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("habit_tracker=info,habit_core=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let config = Config::load();
    if let Some(path) = Config::config_path().filter(|p| !p.exists()) {
        // Write the defaults on first run so there is a file to edit.
        if let Err(err) = config.save_to(&path) {
            tracing::warn!(path = %path.display(), error = %err, "could not write default config");
        }
    }
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = %err, "habit tracker exited with an error");
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    tracing::info!("habit tracker stopped");
    Ok(())
}

fn run_app<B, R>(terminal: &mut Terminal<B>, app: &mut App<R>) -> anyhow::Result<()>
where
    B: ratatui::backend::Backend,
    R: habit_core::HabitRepository,
{
    loop {
        app.tick(Day::today());
        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(TICK_RATE)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.code == KeyCode::Char('q') && key.modifiers.is_empty() && !app.is_editing() {
                break;
            }
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }
            app.handle_key(key);
        }
    }

    Ok(())
}
