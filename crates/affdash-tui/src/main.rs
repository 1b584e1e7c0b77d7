//! affdash - a terminal dashboard for affiliates.
//!
//! Sign in or register, then watch clicks, signups, earnings and payouts,
//! and copy your referral link. A few commands also run without the TUI.

mod app;
mod cli;
mod logging;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use affdash_core::{Config, Session};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

enum Command {
    Tui,
    Login,
    Register,
    Logout,
    Status,
    Link,
    Help,
}

fn parse_args(args: &[String]) -> Result<(Command, bool)> {
    let mut command = Command::Tui;
    let mut ephemeral = false;
    for arg in args {
        match arg.as_str() {
            "--ephemeral" => ephemeral = true,
            "-h" | "--help" | "help" => command = Command::Help,
            "login" => command = Command::Login,
            "register" => command = Command::Register,
            "logout" => command = Command::Logout,
            "status" => command = Command::Status,
            "link" => command = Command::Link,
            other => bail!("Unknown argument: {}\n\n{}", other, cli::USAGE),
        }
    }
    Ok((command, ephemeral))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, ephemeral) = parse_args(&args)?;
    if matches!(command, Command::Help) {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let config_path = Config::config_path().ok();
    let config = match config_path {
        Some(ref path) => Config::load_from(path)?,
        None => Config::default(),
    };
    let data_dir = config.data_dir()?;
    let session = if ephemeral {
        Session::ephemeral()
    } else {
        Session::open(config.token_storage, &data_dir)
    };

    if !matches!(command, Command::Tui) {
        logging::init_cli();
        let mut ctx = cli::Context::new(config, config_path, session)?;
        return match command {
            Command::Login => cli::login(&mut ctx).await,
            Command::Register => cli::register(&mut ctx).await,
            Command::Logout => cli::logout(&ctx),
            Command::Status => cli::status(&ctx).await,
            Command::Link => cli::link(&ctx).await,
            Command::Tui | Command::Help => Ok(()),
        };
    }

    // Initialize logging
    logging::init_tui(&data_dir.join("logs"));
    info!(api_base_url = %config.api_base_url(), "affdash starting");

    // Create app before touching the terminal so config errors print normally
    let mut app = App::new(config, session, config_path)?;
    app.enter_dashboard();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("affdash shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // Ctrl+C to quit
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }

                    // Handle input
                    if handle_input(app, key) {
                        return Ok(());
                    }
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
