use ratatui::style::{Color, Modifier, Style};

use affdash_core::models::{ConversionStatus, EventType, PayoutStatus};

// Color palette
pub const PRIMARY: Color = Color::Rgb(13, 147, 115);
pub const PRIMARY_LIGHT: Color = Color::Rgb(17, 180, 141);
pub const ACCENT: Color = Color::Rgb(212, 168, 67);
pub const ERROR: Color = Color::Rgb(229, 57, 53);
pub const MUTED: Color = Color::Rgb(158, 158, 158);
pub const SURFACE: Color = Color::Rgb(17, 17, 17);
pub const HIGHLIGHT: Color = Color::Rgb(38, 38, 38);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(PRIMARY_LIGHT)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

/// Large numbers on the stat cards
pub fn value_style() -> Style {
    Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(SURFACE).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

// Status badges: settled states in primary, waiting states in accent.

pub fn conversion_status_style(status: &ConversionStatus) -> Style {
    match status {
        ConversionStatus::Approved => Style::default().fg(PRIMARY),
        ConversionStatus::Pending => Style::default().fg(ACCENT),
        _ => muted_style(),
    }
}

pub fn payout_status_style(status: &PayoutStatus) -> Style {
    match status {
        PayoutStatus::Completed => Style::default().fg(PRIMARY),
        PayoutStatus::Pending => Style::default().fg(ACCENT),
        _ => muted_style(),
    }
}

pub fn event_type_style(event_type: &EventType) -> Style {
    match event_type {
        EventType::Payment => Style::default().fg(PRIMARY),
        _ => list_item_style(),
    }
}
