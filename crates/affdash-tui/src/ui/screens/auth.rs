use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, AuthField, AuthTab};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

const FORM_WIDTH: u16 = 54;
/// Visible width of an input box
const INPUT_WIDTH: usize = 28;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.auth;
    let busy = matches!(app.state, AppState::Authenticating);

    let mut lines = vec![];

    lines.push(Line::from(Span::styled(
        "  Affiliate Programme",
        styles::title_style(),
    )));
    lines.push(Line::from(Span::styled(
        "  Earn commission on every referral",
        styles::muted_style(),
    )));
    lines.push(Line::from(""));

    // Tabs
    let mut tabs = vec![Span::raw("  ")];
    for (i, tab) in [AuthTab::SignIn, AuthTab::Register].iter().enumerate() {
        if i > 0 {
            tabs.push(Span::styled(" | ", styles::muted_style()));
        }
        tabs.push(Span::styled(tab.title(), styles::tab_style(*tab == form.tab)));
    }
    lines.push(Line::from(tabs));
    lines.push(Line::from(""));

    for field in form.tab.fields() {
        let (label, value) = match field {
            AuthField::Name => ("Name", form.name.clone()),
            AuthField::Email => ("Email", form.email.clone()),
            AuthField::Password => ("Password", "*".repeat(form.password.chars().count())),
            AuthField::ReferralCode => ("Referral", form.referral_code.clone()),
            AuthField::Button => continue,
        };
        lines.push(input_line(label, &value, form.focus == *field));
    }

    // Submit button
    let button_focused = form.focus == AuthField::Button;
    let label = form.button_label(busy);
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let padded = if button_focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("             ["),
        Span::styled(padded, button_style),
        Span::raw("]"),
    ]));

    if form.tab == AuthTab::Register {
        lines.push(Line::from(Span::styled(
            "  Referral code is optional",
            styles::muted_style(),
        )));
    }

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }

    // Long server messages wrap; the box grows to fit them
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    let inner_width = FORM_WIDTH.min(area.width).saturating_sub(2);
    let height = paragraph.line_count(inner_width) as u16 + 2;
    let form_area = centered_rect_fixed(FORM_WIDTH, height, area);
    frame.render_widget(Clear, form_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(paragraph.block(block), form_area);
}

fn input_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };

    // Show the tail of long values so the cursor stays visible
    let chars: Vec<char> = value.chars().collect();
    let visible: String = chars[chars.len().saturating_sub(INPUT_WIDTH - 1)..]
        .iter()
        .collect();
    let display = format!("{}{}", visible, cursor);

    Line::from(vec![
        Span::styled(format!("  {:<10}[", format!("{}:", label)), styles::muted_style()),
        Span::styled(format!("{:<width$}", display, width = INPUT_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}
