//! Display formatting helpers shared by the TUI and CLI.

pub mod format;

pub use format::{format_date, format_percent, format_rate, referral_link, truncate};
