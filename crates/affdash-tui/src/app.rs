//! Application state management for affdash.
//!
//! This module contains the core `App` struct: which screen is showing, the
//! auth form, the three dashboard queries and the background task channel
//! that delivers their results.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use affdash_core::cache::{needs_fetch, CachedData, Query};
use affdash_core::models::{
    AuthResponse, Conversion, DashboardData, LoginRequest, Payout, RegisterRequest,
};
use affdash_core::utils::referral_link;
use affdash_core::{ApiClient, ApiError, Config, Session};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// Three queries per refresh, with room for a couple of overlapping refreshes.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Maximum length for name, email and password input.
const MAX_FIELD_LENGTH: usize = 128;

/// Maximum length for referral code input.
const MAX_REFERRAL_CODE_LENGTH: usize = 32;

/// How long "Copied!" stays on the referral card.
const COPIED_FEEDBACK: Duration = Duration::from_secs(2);

/// Status bar text while a manual refresh is running.
const REFRESHING: &str = "Refreshing...";

const CONVERSIONS_ERROR_PREFIX: &str = "Conversions: ";
const PAYOUTS_ERROR_PREFIX: &str = "Payouts: ";

/// Shown on the auth screen when the session was rejected by the server.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please sign in again.";

// ============================================================================
// UI State Types
// ============================================================================

/// Which full screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth,
    Dashboard,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    /// Auth request in flight
    Authenticating,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Auth screen tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTab {
    SignIn,
    Register,
}

impl AuthTab {
    pub fn title(&self) -> &'static str {
        match self {
            AuthTab::SignIn => "Sign In",
            AuthTab::Register => "Register",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            AuthTab::SignIn => AuthTab::Register,
            AuthTab::Register => AuthTab::SignIn,
        }
    }

    /// Focusable elements, top to bottom
    pub fn fields(&self) -> &'static [AuthField] {
        match self {
            AuthTab::SignIn => &[AuthField::Email, AuthField::Password, AuthField::Button],
            AuthTab::Register => &[
                AuthField::Name,
                AuthField::Email,
                AuthField::Password,
                AuthField::ReferralCode,
                AuthField::Button,
            ],
        }
    }
}

/// Auth form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Name,
    Email,
    Password,
    ReferralCode,
    Button,
}

/// Which dashboard table the arrow keys scroll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFocus {
    Conversions,
    Payouts,
}

// ============================================================================
// Auth form
// ============================================================================

#[derive(Debug, Clone)]
pub struct AuthForm {
    pub tab: AuthTab,
    pub name: String,
    pub email: String,
    pub password: String,
    pub referral_code: String,
    pub focus: AuthField,
    pub error: Option<String>,
}

impl AuthForm {
    pub fn new(email: Option<String>) -> Self {
        let email = email.unwrap_or_default();
        let focus = if email.is_empty() {
            AuthField::Email
        } else {
            AuthField::Password
        };
        Self {
            tab: AuthTab::SignIn,
            name: String::new(),
            email,
            password: String::new(),
            referral_code: String::new(),
            focus,
            error: None,
        }
    }

    pub fn switch_tab(&mut self) {
        self.tab = self.tab.other();
        self.error = None;
        if !self.tab.fields().contains(&self.focus) {
            self.focus = AuthField::Email;
        }
    }

    fn focus_index(&self) -> usize {
        self.tab
            .fields()
            .iter()
            .position(|f| *f == self.focus)
            .unwrap_or(0)
    }

    pub fn focus_next(&mut self) {
        let fields = self.tab.fields();
        self.focus = fields[(self.focus_index() + 1) % fields.len()];
    }

    pub fn focus_prev(&mut self) {
        let fields = self.tab.fields();
        self.focus = fields[(self.focus_index() + fields.len() - 1) % fields.len()];
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            AuthField::Name => {
                if can_add_field_char(self.name.chars().count(), c) {
                    self.name.push(c);
                }
            }
            AuthField::Email => {
                if can_add_field_char(self.email.chars().count(), c) {
                    self.email.push(c);
                }
            }
            AuthField::Password => {
                if can_add_field_char(self.password.chars().count(), c) {
                    self.password.push(c);
                }
            }
            AuthField::ReferralCode => {
                if can_add_referral_char(self.referral_code.chars().count(), c) {
                    self.referral_code.extend(c.to_uppercase());
                }
            }
            AuthField::Button => {}
        }
    }

    pub fn pop_char(&mut self) {
        match self.focus {
            AuthField::Name => {
                self.name.pop();
            }
            AuthField::Email => {
                self.email.pop();
            }
            AuthField::Password => {
                self.password.pop();
            }
            AuthField::ReferralCode => {
                self.referral_code.pop();
            }
            AuthField::Button => {}
        }
    }

    /// Why the form cannot be submitted yet, if anything.
    pub fn missing_input(&self) -> Option<&'static str> {
        if self.tab == AuthTab::Register && self.name.trim().is_empty() {
            Some("Name, email and password required")
        } else if self.email.trim().is_empty() || self.password.is_empty() {
            Some("Email and password required")
        } else {
            None
        }
    }

    /// Label of the submit button for the current tab.
    pub fn button_label(&self, busy: bool) -> &'static str {
        if busy {
            "Please wait..."
        } else {
            match self.tab {
                AuthTab::SignIn => "Sign In",
                AuthTab::Register => "Create Account",
            }
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned tasks.
///
/// Query results carry the session generation they were started under so
/// results that arrive after a logout are dropped.
enum TaskResult {
    Auth {
        tab: AuthTab,
        email: String,
        result: Result<AuthResponse, ApiError>,
    },
    Dashboard(u64, Result<DashboardData, ApiError>),
    Conversions(u64, Result<Vec<Conversion>, ApiError>),
    Payouts(u64, Result<Vec<Payout>, ApiError>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: Session,
    pub api: ApiClient,
    /// Where `config` is saved; `None` keeps it in memory only
    config_path: Option<PathBuf>,

    // UI State
    pub state: AppState,
    pub screen: Screen,
    pub auth: AuthForm,
    pub focus: TableFocus,
    pub conversion_selection: usize,
    pub payout_selection: usize,

    // Query results
    pub dashboard: Option<CachedData<DashboardData>>,
    pub conversions: Option<CachedData<Vec<Conversion>>>,
    pub payouts: Option<CachedData<Vec<Payout>>>,
    pub dashboard_error: Option<String>,
    in_flight: HashSet<Query>,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
    generation: u64,

    // Status message
    pub status_message: Option<String>,
    copied_at: Option<Instant>,

    track_base_url: String,
    list_limit: usize,
}

impl App {
    /// Create the app. Starts on the dashboard when a token is already stored.
    pub fn new(config: Config, session: Session, config_path: Option<PathBuf>) -> Result<Self> {
        let api_base_url = config.api_base_url();
        let track_base_url = config.track_base_url();
        let list_limit = config.list_limit();
        debug!(api_base_url = %api_base_url, list_limit, "App configured");

        let api = ApiClient::new(&api_base_url, session.clone())?;
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let screen = if session.is_authenticated() {
            Screen::Dashboard
        } else {
            Screen::Auth
        };
        let auth = AuthForm::new(config.last_email.clone());

        Ok(Self {
            config,
            session,
            api,
            config_path,

            state: AppState::Normal,
            screen,
            auth,
            focus: TableFocus::Conversions,
            conversion_selection: 0,
            payout_selection: 0,

            dashboard: None,
            conversions: None,
            payouts: None,
            dashboard_error: None,
            in_flight: HashSet::new(),

            task_rx: rx,
            task_tx: tx,
            generation: 0,

            status_message: None,
            copied_at: None,

            track_base_url,
            list_limit,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Send the login or registration request from the auth form.
    ///
    /// The request runs on a background task; `check_background_tasks`
    /// picks up the result. Incomplete forms are refused with a message.
    pub fn submit_auth(&mut self) {
        if let Some(message) = self.auth.missing_input() {
            self.auth.error = Some(message.to_string());
            return;
        }
        self.auth.error = None;
        self.state = AppState::Authenticating;

        let tab = self.auth.tab;
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let login = LoginRequest::new(&self.auth.email, &self.auth.password);
        let registration = RegisterRequest::new(
            &self.auth.name,
            &self.auth.email,
            &self.auth.password,
            &self.auth.referral_code,
        );

        tokio::spawn(async move {
            let (email, result) = match tab {
                AuthTab::SignIn => {
                    let result = api.login(&login).await;
                    (login.email, result)
                }
                AuthTab::Register => {
                    let result = api.register(&registration).await;
                    (registration.email, result)
                }
            };
            if let Err(e) = tx.send(TaskResult::Auth { tab, email, result }).await {
                error!(error = %e, "Failed to send auth result - channel closed");
            }
        });
    }

    /// On success the token is stored and the dashboard opens. On failure the
    /// error message is shown on the form as-is.
    fn finish_auth(&mut self, tab: AuthTab, email: String, result: Result<AuthResponse, ApiError>) {
        self.state = AppState::Normal;

        match result {
            Ok(auth) => {
                if let Err(e) = self.session.set_token(&auth.token) {
                    warn!(error = %e, "Failed to persist session token");
                }
                info!(tab = tab.title(), "Authentication successful");

                self.config.last_email = Some(email);
                self.save_config();

                self.auth.password.clear();
                self.auth.error = None;
                self.enter_dashboard();
            }
            Err(e) => {
                error!(error = %e, tab = tab.title(), "Authentication failed");
                let message = e.to_string();
                self.auth.error = Some(if message.is_empty() {
                    "Something went wrong".to_string()
                } else {
                    message
                });
            }
        }
    }

    /// Forget the token and return to the auth screen.
    pub fn logout(&mut self) {
        self.sign_out(None);
        info!("Logged out");
    }

    fn sign_out(&mut self, message: Option<&str>) {
        if let Err(e) = self.session.clear_token() {
            warn!(error = %e, "Failed to remove stored session token");
        }
        // Drop anything still in flight for the old session
        self.generation += 1;
        self.in_flight.clear();

        self.dashboard = None;
        self.conversions = None;
        self.payouts = None;
        self.dashboard_error = None;
        self.status_message = None;
        self.copied_at = None;
        self.conversion_selection = 0;
        self.payout_selection = 0;

        self.auth.password.clear();
        self.auth.tab = AuthTab::SignIn;
        self.auth.focus = if self.auth.email.is_empty() {
            AuthField::Email
        } else {
            AuthField::Password
        };
        self.auth.error = message.map(str::to_string);
        self.state = AppState::Normal;
        self.screen = Screen::Auth;
    }

    fn save_config(&self) {
        if let Some(ref path) = self.config_path {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Show the dashboard, or the auth screen when no token is stored.
    pub fn enter_dashboard(&mut self) {
        if !self.is_authenticated() {
            debug!("No token stored, redirecting to sign in");
            self.screen = Screen::Auth;
            return;
        }
        self.screen = Screen::Dashboard;
        self.refresh_stale();
    }

    /// Refetch queries with no result or a stale one.
    pub fn refresh_stale(&mut self) {
        if needs_fetch(self.dashboard.as_ref(), Query::Dashboard) {
            self.spawn_query(Query::Dashboard);
        }
        if needs_fetch(self.conversions.as_ref(), Query::Conversions) {
            self.spawn_query(Query::Conversions);
        }
        if needs_fetch(self.payouts.as_ref(), Query::Payouts) {
            self.spawn_query(Query::Payouts);
        }
    }

    /// Refetch everything regardless of age.
    pub fn refresh_all(&mut self) {
        info!("Refreshing dashboard data");
        for query in Query::ALL {
            self.spawn_query(query);
        }
        self.status_message = Some(REFRESHING.to_string());
    }

    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Run one query on a background task. The three queries run
    /// independently and may complete in any order.
    fn spawn_query(&mut self, query: Query) {
        if !self.in_flight.insert(query) {
            return;
        }
        debug!(query = query.name(), "Spawning query");

        let api = self.api.clone();
        let tx = self.task_tx.clone();
        let generation = self.generation;
        let limit = self.list_limit;

        tokio::spawn(async move {
            let result = match query {
                Query::Dashboard => TaskResult::Dashboard(generation, api.fetch_dashboard().await),
                Query::Conversions => {
                    TaskResult::Conversions(generation, api.fetch_conversions(limit).await)
                }
                Query::Payouts => TaskResult::Payouts(generation, api.fetch_payouts(limit).await),
            };
            if let Err(e) = tx.send(result).await {
                error!(error = %e, "Failed to send query result - channel closed");
            }
        });
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            match result {
                TaskResult::Auth { tab, email, result } => self.finish_auth(tab, email, result),
                TaskResult::Dashboard(generation, result) => {
                    if self.accept(generation, Query::Dashboard) {
                        self.process_dashboard(result);
                    }
                }
                TaskResult::Conversions(generation, result) => {
                    if self.accept(generation, Query::Conversions) {
                        self.process_conversions(result);
                    }
                }
                TaskResult::Payouts(generation, result) => {
                    if self.accept(generation, Query::Payouts) {
                        self.process_payouts(result);
                    }
                }
            }

            if self.in_flight.is_empty() && self.status_message.as_deref() == Some(REFRESHING) {
                self.status_message = None;
            }
        }
    }

    /// Whether a query result belongs to the current session.
    fn accept(&mut self, generation: u64, query: Query) -> bool {
        if generation != self.generation {
            debug!(query = query.name(), "Dropping result from a previous session");
            return false;
        }
        self.in_flight.remove(&query);
        true
    }

    fn process_dashboard(&mut self, result: Result<DashboardData, ApiError>) {
        match result {
            Ok(data) => {
                self.dashboard = Some(CachedData::new(data));
                self.dashboard_error = None;
            }
            Err(e) => {
                if !self.handle_auth_failure(&e) {
                    self.dashboard_error = Some(e.to_string());
                }
            }
        }
    }

    fn process_conversions(&mut self, result: Result<Vec<Conversion>, ApiError>) {
        match result {
            Ok(items) => {
                debug!(count = items.len(), "Conversions fetched");
                self.conversion_selection = self.conversion_selection.min(items.len().saturating_sub(1));
                self.conversions = Some(CachedData::new(items));
                self.clear_status_prefixed(CONVERSIONS_ERROR_PREFIX);
            }
            Err(e) => {
                if !self.handle_auth_failure(&e) {
                    self.status_message = Some(format!("{}{}", CONVERSIONS_ERROR_PREFIX, e));
                }
            }
        }
    }

    fn process_payouts(&mut self, result: Result<Vec<Payout>, ApiError>) {
        match result {
            Ok(items) => {
                debug!(count = items.len(), "Payouts fetched");
                self.payout_selection = self.payout_selection.min(items.len().saturating_sub(1));
                self.payouts = Some(CachedData::new(items));
                self.clear_status_prefixed(PAYOUTS_ERROR_PREFIX);
            }
            Err(e) => {
                if !self.handle_auth_failure(&e) {
                    self.status_message = Some(format!("{}{}", PAYOUTS_ERROR_PREFIX, e));
                }
            }
        }
    }

    fn clear_status_prefixed(&mut self, prefix: &str) {
        if self
            .status_message
            .as_deref()
            .is_some_and(|msg| msg.starts_with(prefix))
        {
            self.status_message = None;
        }
    }

    /// The dashboard never loaded and the failure alert is on screen.
    pub fn showing_load_failure(&self) -> bool {
        self.dashboard.is_none() && self.dashboard_error.is_some()
    }

    /// A rejected token sends the user back to sign in.
    fn handle_auth_failure(&mut self, e: &ApiError) -> bool {
        if e.is_unauthorized() {
            warn!(error = %e, "Session rejected by server");
            self.sign_out(Some(SESSION_EXPIRED_MESSAGE));
            true
        } else {
            false
        }
    }

    // =========================================================================
    // Referral link
    // =========================================================================

    pub fn referral_link(&self) -> Option<String> {
        self.dashboard
            .as_ref()
            .map(|d| referral_link(&self.track_base_url, &d.data.affiliate.referral_code))
    }

    /// Put the referral link on the clipboard. Clipboard failures only
    /// suppress the "Copied!" feedback.
    pub fn copy_referral_link(&mut self) {
        let Some(link) = self.referral_link() else {
            return;
        };
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(link)) {
            Ok(()) => self.copied_at = Some(Instant::now()),
            Err(e) => debug!(error = %e, "Clipboard unavailable"),
        }
    }

    pub fn link_copied(&self) -> bool {
        self.copied_at
            .map(|at| at.elapsed() < COPIED_FEEDBACK)
            .unwrap_or(false)
    }

    // =========================================================================
    // Table navigation
    // =========================================================================

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            TableFocus::Conversions => TableFocus::Payouts,
            TableFocus::Payouts => TableFocus::Conversions,
        };
    }

    fn focused_len(&self) -> usize {
        match self.focus {
            TableFocus::Conversions => self.conversions.as_ref().map_or(0, |c| c.data.len()),
            TableFocus::Payouts => self.payouts.as_ref().map_or(0, |p| p.data.len()),
        }
    }

    fn focused_selection(&mut self) -> &mut usize {
        match self.focus {
            TableFocus::Conversions => &mut self.conversion_selection,
            TableFocus::Payouts => &mut self.payout_selection,
        }
    }

    pub fn select_next(&mut self) {
        let max_index = self.focused_len().saturating_sub(1);
        let selection = self.focused_selection();
        *selection = (*selection + 1).min(max_index);
    }

    pub fn select_prev(&mut self) {
        let selection = self.focused_selection();
        *selection = selection.saturating_sub(1);
    }

    /// "Updated 5s ago" for the status bar
    pub fn last_updated(&self) -> String {
        self.dashboard
            .as_ref()
            .map(|d| d.age_display())
            .unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

/// Referral codes are short and contain no spaces
pub fn can_add_referral_char(current_len: usize, c: char) -> bool {
    current_len < MAX_REFERRAL_CODE_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use affdash_core::testing::{HttpMethod, MockApi};
    use serde_json::json;

    fn dashboard_json() -> serde_json::Value {
        json!({
            "stats": {
                "total_clicks": 10,
                "total_signups": 2,
                "total_earnings_pence": 1500,
                "total_paid_pence": 500,
                "pending_pence": 1000,
                "conversion_rate": 20.0,
                "last_30_days_clicks": 7,
                "last_30_days_signups": 1
            },
            "affiliate": {
                "id": "aff_1",
                "name": "Ahmed Khan",
                "email": "a@b.com",
                "referral_code": "AHMED",
                "commission_rate": 10
            }
        })
    }

    fn mock_dashboard(mock: &MockApi) {
        mock.respond_json(HttpMethod::GET, "/dashboard", 200, dashboard_json());
        mock.respond_json(HttpMethod::GET, "/conversions?limit=20", 200, json!({"items": []}));
        mock.respond_json(HttpMethod::GET, "/payouts?limit=20", 200, json!({"items": []}));
    }

    fn test_app(mock: &MockApi, session: Session) -> App {
        let config = Config {
            api_base_url: Some(mock.base_url().to_string()),
            ..Default::default()
        };
        App::new(config, session, None).unwrap()
    }

    /// Pump the channel until every spawned query has reported back.
    async fn settle(app: &mut App) {
        for _ in 0..200 {
            app.check_background_tasks();
            if !app.is_loading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("queries did not complete");
    }

    /// Pump the channel until the sign-in request has finished.
    async fn settle_auth(app: &mut App) {
        for _ in 0..200 {
            app.check_background_tasks();
            if app.state != AppState::Authenticating {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("auth request did not complete");
    }

    /// App with a token and a fully loaded dashboard.
    async fn loaded_app(mock: &MockApi) -> App {
        mock_dashboard(mock);
        let session = Session::ephemeral();
        session.set_token("t1").unwrap();
        let mut app = test_app(mock, session);
        app.enter_dashboard();
        settle(&mut app).await;
        assert!(app.dashboard.is_some());
        app
    }

    #[tokio::test]
    async fn test_starts_on_auth_without_token() {
        let mock = MockApi::start().await.unwrap();
        let app = test_app(&mock, Session::ephemeral());
        assert_eq!(app.screen, Screen::Auth);
    }

    #[tokio::test]
    async fn test_login_stores_token_and_opens_dashboard() {
        let mock = MockApi::start().await.unwrap();
        mock.respond_json(HttpMethod::POST, "/auth/login", 200, json!({"token": "t1"}));
        mock_dashboard(&mock);

        let session = Session::ephemeral();
        let mut app = test_app(&mock, session.clone());
        app.auth.email = "a@b.com".into();
        app.auth.password = "x".into();

        app.submit_auth();
        assert_eq!(app.state, AppState::Authenticating);
        settle_auth(&mut app).await;

        assert_eq!(session.get_token().as_deref(), Some("t1"));
        assert_eq!(app.screen, Screen::Dashboard);
        assert_eq!(app.state, AppState::Normal);
        assert!(app.auth.password.is_empty());

        let login = &mock.requests_to("/auth/login")[0];
        assert_eq!(login.json().unwrap(), json!({"email": "a@b.com", "password": "x"}));
        assert_eq!(login.header("authorization"), None);

        settle(&mut app).await;
        assert_eq!(app.dashboard.as_ref().unwrap().data.stats.total_clicks, 10);
        for path in ["/dashboard", "/conversions?limit=20", "/payouts?limit=20"] {
            assert_eq!(
                mock.requests_to(path)[0].header("authorization"),
                Some("Bearer t1")
            );
        }
    }

    #[tokio::test]
    async fn test_register_sends_normalized_fields() {
        let mock = MockApi::start().await.unwrap();
        mock.respond_json(HttpMethod::POST, "/auth/register", 200, json!({"token": "r1"}));
        mock_dashboard(&mock);

        let mut app = test_app(&mock, Session::ephemeral());
        app.auth.switch_tab();
        app.auth.name = " Ahmed Khan ".into();
        app.auth.email = " Ahmed@Example.COM".into();
        app.auth.password = "pw".into();
        app.auth.referral_code = "ahmed".into();

        app.submit_auth();
        settle_auth(&mut app).await;

        let body = mock.requests_to("/auth/register")[0].json().unwrap();
        assert_eq!(
            body,
            json!({"name": "Ahmed Khan", "email": "ahmed@example.com", "password": "pw",
                   "referral_code": "AHMED"})
        );
        assert_eq!(app.session.get_token().as_deref(), Some("r1"));
        settle(&mut app).await;
    }

    #[tokio::test]
    async fn test_failed_login_shows_server_message() {
        let mock = MockApi::start().await.unwrap();
        mock.respond_json(
            HttpMethod::POST,
            "/auth/login",
            401,
            json!({"error": "Invalid email or password"}),
        );

        let mut app = test_app(&mock, Session::ephemeral());
        app.auth.email = "a@b.com".into();
        app.auth.password = "wrong".into();
        app.submit_auth();
        settle_auth(&mut app).await;

        assert_eq!(app.auth.error.as_deref(), Some("Invalid email or password"));
        assert_eq!(app.screen, Screen::Auth);
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.session.get_token(), None);
    }

    #[tokio::test]
    async fn test_network_failure_stays_on_form() {
        let config = Config {
            api_base_url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };
        let mut app = App::new(config, Session::ephemeral(), None).unwrap();
        app.auth.email = "a@b.com".into();
        app.auth.password = "x".into();
        app.submit_auth();
        settle_auth(&mut app).await;

        let error = app.auth.error.clone().unwrap();
        assert!(error.starts_with("Network error:"), "{}", error);
        assert_eq!(app.screen, Screen::Auth);
        assert_eq!(app.auth.email, "a@b.com");
        assert_eq!(app.session.get_token(), None);
    }

    #[tokio::test]
    async fn test_submit_refused_when_incomplete() {
        let mock = MockApi::start().await.unwrap();
        let mut app = test_app(&mock, Session::ephemeral());

        app.auth.email = "a@b.com".into();
        app.submit_auth();
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.auth.error.as_deref(), Some("Email and password required"));

        app.auth.switch_tab();
        assert_eq!(app.auth.error, None);
        app.auth.password = "pw".into();
        app.submit_auth();
        assert_eq!(app.state, AppState::Normal);
        assert!(app.auth.error.is_some());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_entering_dashboard_without_token_redirects() {
        let mock = MockApi::start().await.unwrap();
        let mut app = test_app(&mock, Session::ephemeral());
        app.screen = Screen::Dashboard;
        app.enter_dashboard();
        assert_eq!(app.screen, Screen::Auth);
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_query_signs_out() {
        let mock = MockApi::start().await.unwrap();
        mock_dashboard(&mock);
        mock.respond_json(HttpMethod::GET, "/dashboard", 401, json!({"error": "Token revoked"}));

        let session = Session::ephemeral();
        session.set_token("stale").unwrap();
        let mut app = test_app(&mock, session.clone());
        app.enter_dashboard();

        for _ in 0..200 {
            app.check_background_tasks();
            if app.screen == Screen::Auth {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(app.screen, Screen::Auth);
        assert_eq!(app.auth.error.as_deref(), Some(SESSION_EXPIRED_MESSAGE));
        assert_eq!(session.get_token(), None);
    }

    #[tokio::test]
    async fn test_dashboard_failure_is_shown_inline() {
        let mock = MockApi::start().await.unwrap();
        mock_dashboard(&mock);
        mock.respond(HttpMethod::GET, "/dashboard", 500, "");

        let session = Session::ephemeral();
        session.set_token("t1").unwrap();
        let mut app = test_app(&mock, session);
        app.enter_dashboard();
        settle(&mut app).await;

        assert_eq!(app.screen, Screen::Dashboard);
        assert!(app.dashboard.is_none());
        assert_eq!(app.dashboard_error.as_deref(), Some("Request failed: 500"));
        assert!(app.conversions.as_ref().unwrap().data.is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cached_dashboard_and_reports_error() {
        let mock = MockApi::start().await.unwrap();
        let mut app = loaded_app(&mock).await;

        mock.respond_json(HttpMethod::GET, "/dashboard", 500, json!({"error": "Database down"}));
        app.refresh_all();
        settle(&mut app).await;

        assert_eq!(app.screen, Screen::Dashboard);
        assert!(app.dashboard.is_some());
        assert_eq!(app.dashboard_error.as_deref(), Some("Database down"));
        assert!(!app.showing_load_failure());
        assert_eq!(app.session.get_token().as_deref(), Some("t1"));

        // A later successful refresh clears it
        mock.respond_json(HttpMethod::GET, "/dashboard", 200, dashboard_json());
        app.refresh_all();
        settle(&mut app).await;
        assert_eq!(app.dashboard_error, None);
    }

    #[tokio::test]
    async fn test_list_failures_go_to_status_bar() {
        let mock = MockApi::start().await.unwrap();
        let mut app = loaded_app(&mock).await;

        mock.respond_json(
            HttpMethod::GET,
            "/conversions?limit=20",
            500,
            json!({"error": "Database down"}),
        );
        app.refresh_all();
        settle(&mut app).await;
        assert_eq!(app.status_message.as_deref(), Some("Conversions: Database down"));
        assert!(app.conversions.is_some());

        mock.respond(HttpMethod::GET, "/payouts?limit=20", 502, "");
        app.refresh_all();
        settle(&mut app).await;
        let status = app.status_message.clone().unwrap();
        assert!(status == "Conversions: Database down" || status == "Payouts: Request failed: 502");

        mock.respond_json(HttpMethod::GET, "/conversions?limit=20", 200, json!({"items": []}));
        mock.respond_json(HttpMethod::GET, "/payouts?limit=20", 200, json!({"items": []}));
        app.refresh_all();
        settle(&mut app).await;
        assert_eq!(app.status_message, None);
    }

    #[tokio::test]
    async fn test_copied_feedback_lasts_two_seconds() {
        let mock = MockApi::start().await.unwrap();
        let mut app = test_app(&mock, Session::ephemeral());
        assert!(!app.link_copied());

        app.copied_at = Some(Instant::now());
        assert!(app.link_copied());

        app.copied_at = Instant::now().checked_sub(Duration::from_millis(2100));
        assert!(!app.link_copied());
    }

    #[tokio::test]
    async fn test_fresh_queries_are_not_refetched() {
        let mock = MockApi::start().await.unwrap();
        mock_dashboard(&mock);

        let session = Session::ephemeral();
        session.set_token("t1").unwrap();
        let mut app = test_app(&mock, session);
        app.enter_dashboard();
        settle(&mut app).await;
        assert_eq!(mock.requests().len(), 3);

        app.enter_dashboard();
        settle(&mut app).await;
        assert_eq!(mock.requests().len(), 3);

        app.refresh_all();
        settle(&mut app).await;
        assert_eq!(mock.requests().len(), 6);
        assert_eq!(app.status_message, None);
    }

    #[tokio::test]
    async fn test_logout_clears_token_and_drops_late_results() {
        let mock = MockApi::start().await.unwrap();
        mock_dashboard(&mock);

        let session = Session::ephemeral();
        session.set_token("t1").unwrap();
        let mut app = test_app(&mock, session.clone());
        app.enter_dashboard();
        app.logout();

        assert_eq!(session.get_token(), None);
        assert_eq!(app.screen, Screen::Auth);
        assert!(!app.is_loading());

        tokio::time::sleep(Duration::from_millis(200)).await;
        app.check_background_tasks();
        assert!(app.dashboard.is_none());
    }

    #[tokio::test]
    async fn test_referral_link_uses_track_base() {
        let mock = MockApi::start().await.unwrap();
        mock_dashboard(&mock);

        let session = Session::ephemeral();
        session.set_token("t1").unwrap();
        let mut app = test_app(&mock, session);
        assert_eq!(app.referral_link(), None);

        app.enter_dashboard();
        settle(&mut app).await;
        assert_eq!(
            app.referral_link(),
            Some(format!("{}/track/AHMED", mock.base_url()))
        );
    }

    // -------------------------------------------------------------------------
    // Auth form
    // -------------------------------------------------------------------------

    #[test]
    fn test_auth_form_focus_cycles_through_tab_fields() {
        let mut form = AuthForm::new(None);
        assert_eq!(form.focus, AuthField::Email);
        form.focus_next();
        assert_eq!(form.focus, AuthField::Password);
        form.focus_next();
        assert_eq!(form.focus, AuthField::Button);
        form.focus_next();
        assert_eq!(form.focus, AuthField::Email);
        form.focus_prev();
        assert_eq!(form.focus, AuthField::Button);
    }

    #[test]
    fn test_auth_form_prefilled_email_focuses_password() {
        let form = AuthForm::new(Some("a@b.com".into()));
        assert_eq!(form.focus, AuthField::Password);
    }

    #[test]
    fn test_switching_to_sign_in_moves_focus_off_register_fields() {
        let mut form = AuthForm::new(None);
        form.switch_tab();
        form.focus = AuthField::ReferralCode;
        form.switch_tab();
        assert_eq!(form.tab, AuthTab::SignIn);
        assert_eq!(form.focus, AuthField::Email);
    }

    #[test]
    fn test_referral_code_is_uppercased_as_typed() {
        let mut form = AuthForm::new(None);
        form.switch_tab();
        form.focus = AuthField::ReferralCode;
        for c in "ab c1".chars() {
            form.push_char(c);
        }
        assert_eq!(form.referral_code, "ABC1");
        form.pop_char();
        assert_eq!(form.referral_code, "ABC");
    }

    #[test]
    fn test_button_label() {
        let mut form = AuthForm::new(None);
        assert_eq!(form.button_label(false), "Sign In");
        assert_eq!(form.button_label(true), "Please wait...");
        form.switch_tab();
        assert_eq!(form.button_label(false), "Create Account");
    }

    #[test]
    fn test_can_add_field_char() {
        assert!(can_add_field_char(0, 'a'));
        assert!(can_add_field_char(127, '!'));
        assert!(!can_add_field_char(128, 'a'));
        assert!(!can_add_field_char(0, '\x00'));
        assert!(!can_add_field_char(0, '\n'));
    }

    #[test]
    fn test_can_add_referral_char() {
        assert!(can_add_referral_char(0, 'A'));
        assert!(!can_add_referral_char(0, ' '));
        assert!(!can_add_referral_char(32, 'A'));
    }
}
