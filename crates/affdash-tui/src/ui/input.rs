//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes. Returns `true`
//! when the app should quit.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, AppState, AuthField, Screen};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    // Auth request pending; the main loop finishes it before reading keys again
    if matches!(app.state, AppState::Authenticating) {
        return false;
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return false;
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return true;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return false;
    }

    match app.screen {
        Screen::Auth => handle_auth_input(app, key),
        Screen::Dashboard => handle_dashboard_input(app, key),
    }
}

fn handle_auth_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            // Quit from the sign-in screen
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Down | KeyCode::Tab => app.auth.focus_next(),
        KeyCode::Up | KeyCode::BackTab => app.auth.focus_prev(),
        KeyCode::Left | KeyCode::Right => app.auth.switch_tab(),
        KeyCode::Enter => {
            if app.auth.focus == AuthField::Button {
                app.submit_auth();
            } else {
                app.auth.focus_next();
            }
        }
        KeyCode::Backspace => app.auth.pop_char(),
        KeyCode::Char('?') if app.auth.focus == AuthField::Button => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char(c) => app.auth.push_char(c),
        _ => {}
    }
    false
}

fn handle_dashboard_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('r') => app.refresh_all(),
        KeyCode::Char('c') => app.copy_referral_link(),
        KeyCode::Char('l') => app.logout(),
        KeyCode::Tab | KeyCode::BackTab => app.toggle_focus(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        // The failure alert offers a way back to sign in
        KeyCode::Enter if app.showing_load_failure() => app.logout(),
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AuthTab, TableFocus};
    use affdash_core::cache::CachedData;
    use affdash_core::{Config, Session};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_input(app, key(KeyCode::Char(c)));
        }
    }

    fn offline_app(session: Session) -> App {
        let config = Config {
            api_base_url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };
        App::new(config, session, None).unwrap()
    }

    #[tokio::test]
    async fn test_typing_fills_focused_field_and_enter_submits() {
        let mut app = offline_app(Session::ephemeral());
        type_text(&mut app, "a@b.com");
        handle_input(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "x");
        handle_input(&mut app, key(KeyCode::Enter));
        assert_eq!(app.auth.focus, AuthField::Button);

        handle_input(&mut app, key(KeyCode::Enter));
        assert_eq!(app.auth.email, "a@b.com");
        assert_eq!(app.auth.password, "x");
        assert_eq!(app.state, AppState::Authenticating);

        // Keys are ignored while the request is pending
        handle_input(&mut app, key(KeyCode::Char('z')));
        assert_eq!(app.auth.password, "x");
    }

    #[tokio::test]
    async fn test_arrows_switch_auth_tab() {
        let mut app = offline_app(Session::ephemeral());
        handle_input(&mut app, key(KeyCode::Right));
        assert_eq!(app.auth.tab, AuthTab::Register);
        handle_input(&mut app, key(KeyCode::Left));
        assert_eq!(app.auth.tab, AuthTab::SignIn);
    }

    #[tokio::test]
    async fn test_escape_on_auth_quits() {
        let mut app = offline_app(Session::ephemeral());
        assert!(handle_input(&mut app, key(KeyCode::Esc)));
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_quit_needs_confirmation_on_dashboard() {
        let session = Session::ephemeral();
        session.set_token("t1").unwrap();
        let mut app = offline_app(session);
        assert_eq!(app.screen, Screen::Dashboard);

        assert!(!handle_input(&mut app, key(KeyCode::Char('q'))));
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(!handle_input(&mut app, key(KeyCode::Char('n'))));
        assert_eq!(app.state, AppState::Normal);

        handle_input(&mut app, key(KeyCode::Char('q')));
        assert!(handle_input(&mut app, key(KeyCode::Char('y'))));
    }

    #[tokio::test]
    async fn test_dashboard_keys() {
        let session = Session::ephemeral();
        session.set_token("t1").unwrap();
        let mut app = offline_app(session.clone());

        handle_input(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, TableFocus::Payouts);

        handle_input(&mut app, key(KeyCode::Char('?')));
        assert_eq!(app.state, AppState::ShowingHelp);
        handle_input(&mut app, key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Normal);

        handle_input(&mut app, key(KeyCode::Char('l')));
        assert_eq!(app.screen, Screen::Auth);
        assert_eq!(session.get_token(), None);
    }

    #[tokio::test]
    async fn test_enter_on_failure_alert_returns_to_sign_in() {
        let session = Session::ephemeral();
        session.set_token("t1").unwrap();
        let mut app = offline_app(session.clone());

        handle_input(&mut app, key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Dashboard);

        app.dashboard_error = Some("Network error".to_string());
        handle_input(&mut app, key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Auth);
        assert_eq!(session.get_token(), None);
    }

    #[tokio::test]
    async fn test_enter_ignored_when_refresh_fails_over_cached_data() {
        let session = Session::ephemeral();
        session.set_token("t1").unwrap();
        let mut app = offline_app(session.clone());

        let data = serde_json::from_value(serde_json::json!({
            "stats": {
                "total_clicks": 1, "total_signups": 0, "total_earnings_pence": 0,
                "total_paid_pence": 0, "pending_pence": 0, "conversion_rate": 0.0
            },
            "affiliate": {
                "id": "aff_1", "name": "A", "email": "a@b.com",
                "referral_code": "A1", "commission_rate": 10
            }
        }))
        .unwrap();
        app.dashboard = Some(CachedData::new(data));
        app.dashboard_error = Some("Database down".to_string());

        handle_input(&mut app, key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Dashboard);
        assert_eq!(session.get_token().as_deref(), Some("t1"));
    }
}
