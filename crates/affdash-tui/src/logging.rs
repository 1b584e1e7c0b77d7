//! Tracing setup.
//!
//! The TUI owns the terminal, so it logs to a daily rolling file in the data
//! directory. CLI commands log to stderr.

use std::io;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "affdash.log";

/// Log to `<log_dir>/affdash.log.YYYY-MM-DD`.
/// Use RUST_LOG to override the filter (e.g. `RUST_LOG=debug`).
pub fn init_tui(log_dir: &Path) {
    // File logging is best effort; the app runs without it
    if std::fs::create_dir_all(log_dir).is_err() {
        return;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();
}

/// Warnings and errors to stderr for non-interactive commands.
pub fn init_cli() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init();
}
