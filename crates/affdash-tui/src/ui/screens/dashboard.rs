//! Stats, referral link and activity tables.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use affdash_core::models::{Conversion, DashboardData, Pence, Payout};
use affdash_core::utils::{format_date, format_percent, format_rate};

use crate::app::{App, TableFocus};
use crate::ui::styles;

pub const NO_CONVERSIONS: &str = "No conversions yet. Share your referral link to get started!";
pub const NO_PAYOUTS: &str = "No payouts yet.";
pub const LOAD_FAILED: &str = "Failed to load dashboard. Please sign in again.";

/// One summary tile on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub detail: String,
}

/// The six summary tiles, in display order.
pub fn stat_cards(data: &DashboardData) -> Vec<StatCard> {
    let stats = &data.stats;
    vec![
        StatCard {
            label: "Total Clicks",
            value: stats.total_clicks.to_string(),
            detail: format!("{} last 30d", stats.last_30_days_clicks),
        },
        StatCard {
            label: "Total Signups",
            value: stats.total_signups.to_string(),
            detail: format!("{} last 30d", stats.last_30_days_signups),
        },
        StatCard {
            label: "Conversion Rate",
            value: format_percent(stats.conversion_rate),
            detail: "clicks → signups".to_string(),
        },
        StatCard {
            label: "Total Earned",
            value: stats.total_earnings_pence.to_string(),
            detail: format!("{}% commission", format_rate(data.affiliate.commission_rate)),
        },
        StatCard {
            label: "Paid Out",
            value: stats.total_paid_pence.to_string(),
            detail: "completed".to_string(),
        },
        StatCard {
            label: "Pending",
            value: stats.pending_pence.to_string(),
            detail: "awaiting payout".to_string(),
        },
    ]
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref cached) = app.dashboard else {
        match app.dashboard_error {
            Some(ref error) => render_error(frame, error, area),
            None => render_loading(frame, area),
        }
        return;
    };
    let data = &cached.data;

    // Refresh failed while older data is still on screen
    let refresh_alert = app.dashboard_error.as_ref().map(|error| {
        Paragraph::new(Line::from(vec![
            Span::styled(format!(" Refresh failed: {}", error), styles::error_style()),
            Span::styled(
                format!("  (showing data from {}, [r] to retry)", cached.age_display()),
                styles::muted_style(),
            ),
        ]))
        .wrap(Wrap { trim: false })
    });
    let alert_height = refresh_alert
        .as_ref()
        .map_or(0, |p| p.line_count(area.width) as u16);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),            // Greeting
            Constraint::Length(alert_height), // Refresh failure
            Constraint::Length(4),            // Referral card
            Constraint::Length(8),            // Stat cards
            Constraint::Min(6),               // Tables
        ])
        .split(area);

    render_greeting(frame, data, chunks[0]);
    if let Some(alert) = refresh_alert {
        frame.render_widget(alert, chunks[1]);
    }
    render_referral_card(frame, app, data, chunks[2]);
    render_stats(frame, data, chunks[3]);

    let tables = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[4]);
    render_conversions(frame, app, tables[0]);
    render_payouts(frame, app, tables[1]);
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("  Loading dashboard...", styles::muted_style())),
    ]);
    frame.render_widget(paragraph, area);
}

fn render_error(frame: &mut Frame, error: &str, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(LOAD_FAILED, styles::error_style())),
        Line::from(Span::styled(error.to_string(), styles::muted_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" to sign in", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::error_style());
    let width = area.width.min(64).saturating_sub(2);
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    let height = (paragraph.line_count(width.saturating_sub(2)) as u16).min(area.height.saturating_sub(1));
    let alert = Rect::new(area.x + 1, area.y + 1, width, height);
    frame.render_widget(paragraph, alert);
}

fn render_greeting(frame: &mut Frame, data: &DashboardData, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            format!(" Hey, {}", data.affiliate.first_name()),
            styles::value_style(),
        )),
        Line::from(Span::styled(
            format!(" {}", data.affiliate.email),
            styles::muted_style(),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_referral_card(frame: &mut Frame, app: &App, data: &DashboardData, area: Rect) {
    let link = app.referral_link().unwrap_or_default();
    let copy = if app.link_copied() {
        Span::styled("Copied!", styles::success_style())
    } else {
        Span::styled("[c] Copy", styles::help_key_style())
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(link, styles::highlight_style()),
            Span::raw("  "),
            copy,
        ]),
        Line::from(Span::styled(
            format!(
                "Code: {} · Commission: {}%",
                data.affiliate.referral_code,
                format_rate(data.affiliate.commission_rate)
            ),
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .title(" Your Referral Link ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_stats(frame: &mut Frame, data: &DashboardData, area: Rect) {
    let cards = stat_cards(data);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(4)])
        .split(area);

    for (row_area, row_cards) in rows.iter().zip(cards.chunks(3)) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(*row_area);
        for (card_area, card) in cols.iter().zip(row_cards) {
            render_stat_card(frame, card, *card_area);
        }
    }
}

pub fn render_stat_card(frame: &mut Frame, card: &StatCard, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(card.value.clone(), styles::value_style())),
        Line::from(Span::styled(card.detail.clone(), styles::muted_style())),
    ];
    let block = Block::default()
        .title(format!(" {} ", card.label))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Zero amounts (e.g. signup events) show a dash
fn amount_cell(amount: Pence) -> String {
    if amount.is_positive() {
        amount.to_string()
    } else {
        "—".to_string()
    }
}

fn table_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
}

fn render_empty(frame: &mut Frame, block: Block<'static>, message: &'static str, area: Rect) {
    let paragraph = Paragraph::new(Line::from(Span::styled(message, styles::muted_style())))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_conversions(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == TableFocus::Conversions;
    let items: &[Conversion] = app.conversions.as_ref().map(|c| c.data.as_slice()).unwrap_or(&[]);
    let block = table_block(" Recent Conversions ".to_string(), focused);

    if app.conversions.is_none() {
        render_empty(frame, block, "Loading...", area);
        return;
    }
    if items.is_empty() {
        render_empty(frame, block, NO_CONVERSIONS, area);
        return;
    }

    let header = Row::new(["Type", "Amount", "Commission", "Status", "Date"])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = items
        .iter()
        .map(|c| {
            Row::new(vec![
                Cell::from(Span::styled(
                    c.event_type.to_string(),
                    styles::event_type_style(&c.event_type),
                )),
                Cell::from(amount_cell(c.amount_pence)),
                Cell::from(amount_cell(c.commission_pence)),
                Cell::from(Span::styled(
                    c.status.to_string(),
                    styles::conversion_status_style(&c.status),
                )),
                Cell::from(format_date(&c.created_at)),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Length(11),
        Constraint::Length(10),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if focused {
        state.select(Some(app.conversion_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_payouts(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == TableFocus::Payouts;
    let items: &[Payout] = app.payouts.as_ref().map(|p| p.data.as_slice()).unwrap_or(&[]);
    let block = table_block(" Payout History ".to_string(), focused);

    if app.payouts.is_none() {
        render_empty(frame, block, "Loading...", area);
        return;
    }
    if items.is_empty() {
        render_empty(frame, block, NO_PAYOUTS, area);
        return;
    }

    let header = Row::new(["Amount", "Method", "Status", "Date"])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = items
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from(p.amount_pence.to_string()),
                Cell::from(p.method.clone()),
                Cell::from(Span::styled(
                    p.status.to_string(),
                    styles::payout_status_style(&p.status),
                )),
                Cell::from(format_date(&p.created_at)),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Fill(1),
        Constraint::Length(11),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if focused {
        state.select(Some(app.payout_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
