//! Non-interactive commands: `login`, `register`, `logout`, `status`, `link`.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use tracing::{info, warn};

use affdash_core::models::{DashboardData, LoginRequest, RegisterRequest};
use affdash_core::utils::{format_date, referral_link, truncate};
use affdash_core::{ApiClient, ApiError, Config, Session};

use crate::app::SESSION_EXPIRED_MESSAGE;
use crate::ui::screens::dashboard::stat_cards;

pub const USAGE: &str = "\
affdash - affiliate dashboard

USAGE:
    affdash [--ephemeral]            Open the dashboard
    affdash login                    Sign in and store the session token
    affdash register                 Create an affiliate account
    affdash logout                   Forget the stored session token
    affdash status                   Print stats and recent activity
    affdash link                     Print your referral link
    affdash --help                   Show this message

OPTIONS:
    --ephemeral    Keep the session token in memory only

ENVIRONMENT:
    AFFILIATE_API_URL    API base URL (also read from .env)
    RUST_LOG             Log filter";

/// Everything a command needs.
pub struct Context {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub session: Session,
    pub api: ApiClient,
}

impl Context {
    pub fn new(config: Config, config_path: Option<PathBuf>, session: Session) -> Result<Self> {
        let api = ApiClient::new(&config.api_base_url(), session.clone())?;
        Ok(Self {
            config,
            config_path,
            session,
            api,
        })
    }

    fn remember_email(&mut self, email: &str) {
        self.config.last_email = Some(email.to_string());
        if let Some(ref path) = self.config_path {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    fn require_token(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            bail!("Not signed in. Run `affdash login` first.");
        }
        Ok(())
    }

    /// Map a rejected token to the sign-in message, clearing it on the way.
    fn check_auth(&self, e: ApiError) -> anyhow::Error {
        if e.is_unauthorized() {
            if let Err(clear_err) = self.session.clear_token() {
                warn!(error = %clear_err, "Failed to remove stored session token");
            }
            anyhow::anyhow!(SESSION_EXPIRED_MESSAGE)
        } else {
            e.into()
        }
    }
}

fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim();
    Ok(match default {
        Some(d) if value.is_empty() => d.to_string(),
        _ => value.to_string(),
    })
}

fn prompt_password() -> Result<String> {
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

pub async fn login(ctx: &mut Context) -> Result<()> {
    let email = prompt("Email", ctx.config.last_email.as_deref())?;
    let password = prompt_password()?;
    if email.is_empty() || password.is_empty() {
        bail!("Email and password required");
    }

    let request = LoginRequest::new(&email, &password);
    let auth = ctx.api.login(&request).await?;
    ctx.session.set_token(&auth.token)?;
    info!("Signed in from CLI");

    ctx.remember_email(&request.email);
    println!("Signed in as {}", request.email);
    Ok(())
}

pub async fn register(ctx: &mut Context) -> Result<()> {
    let name = prompt("Name", None)?;
    let email = prompt("Email", None)?;
    let password = prompt_password()?;
    let referral_code = prompt("Referral code (optional)", None)?;
    if name.is_empty() || email.is_empty() || password.is_empty() {
        bail!("Name, email and password required");
    }

    let request = RegisterRequest::new(&name, &email, &password, &referral_code);
    let auth = ctx.api.register(&request).await?;
    ctx.session.set_token(&auth.token)?;
    info!("Registered from CLI");

    ctx.remember_email(&request.email);
    println!("Account created. Signed in as {}", request.email);
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    ctx.session.clear_token()?;
    println!("Signed out");
    Ok(())
}

async fn fetch_dashboard(ctx: &Context) -> Result<DashboardData> {
    ctx.require_token()?;
    ctx.api.fetch_dashboard().await.map_err(|e| ctx.check_auth(e))
}

pub async fn link(ctx: &Context) -> Result<()> {
    let data = fetch_dashboard(ctx).await?;
    println!(
        "{}",
        referral_link(&ctx.config.track_base_url(), &data.affiliate.referral_code)
    );
    Ok(())
}

pub async fn status(ctx: &Context) -> Result<()> {
    ctx.require_token()?;
    let limit = ctx.config.list_limit();
    let (dashboard, conversions, payouts) = tokio::join!(
        ctx.api.fetch_dashboard(),
        ctx.api.fetch_conversions(limit),
        ctx.api.fetch_payouts(limit),
    );
    let data = dashboard.map_err(|e| ctx.check_auth(e))?;
    let conversions = conversions.map_err(|e| ctx.check_auth(e))?;
    let payouts = payouts.map_err(|e| ctx.check_auth(e))?;

    println!("{} <{}>", data.affiliate.name, data.affiliate.email);
    println!(
        "Referral link: {}",
        referral_link(&ctx.config.track_base_url(), &data.affiliate.referral_code)
    );
    println!();

    for card in stat_cards(&data) {
        println!("  {:<16} {:>12}   {}", card.label, card.value, card.detail);
    }

    println!();
    println!("Recent conversions:");
    if conversions.is_empty() {
        println!("  No conversions yet.");
    }
    for c in &conversions {
        println!(
            "  {}  {:<8} {:>10} {:>10}  {}",
            format_date(&c.created_at),
            truncate(c.event_type.as_str(), 8),
            c.amount_pence.to_string(),
            c.commission_pence.to_string(),
            c.status
        );
    }

    println!();
    println!("Payouts:");
    if payouts.is_empty() {
        println!("  No payouts yet.");
    }
    for p in &payouts {
        println!(
            "  {}  {:>10}  {:<16} {}",
            format_date(&p.created_at),
            p.amount_pence.to_string(),
            truncate(&p.method, 16),
            p.status
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use affdash_core::testing::{HttpMethod, MockApi};
    use serde_json::json;

    async fn context(mock: &MockApi, session: Session) -> Context {
        let config = Config {
            api_base_url: Some(mock.base_url().to_string()),
            ..Default::default()
        };
        Context::new(config, None, session).unwrap()
    }

    #[tokio::test]
    async fn test_status_requires_token() {
        let mock = MockApi::start().await.unwrap();
        let ctx = context(&mock, Session::ephemeral()).await;
        let err = status(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("Not signed in"));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_link_clears_rejected_token() {
        let mock = MockApi::start().await.unwrap();
        mock.respond_json(HttpMethod::GET, "/dashboard", 403, json!({"error": "Forbidden"}));

        let session = Session::ephemeral();
        session.set_token("old").unwrap();
        let ctx = context(&mock, session.clone()).await;

        let err = link(&ctx).await.unwrap_err();
        assert_eq!(err.to_string(), SESSION_EXPIRED_MESSAGE);
        assert_eq!(session.get_token(), None);
    }

    #[tokio::test]
    async fn test_server_errors_pass_through() {
        let mock = MockApi::start().await.unwrap();
        mock.respond_json(HttpMethod::GET, "/dashboard", 500, json!({"error": "Database down"}));

        let session = Session::ephemeral();
        session.set_token("t1").unwrap();
        let ctx = context(&mock, session.clone()).await;

        let err = link(&ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "Database down");
        assert_eq!(session.get_token().as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let mock = MockApi::start().await.unwrap();
        let session = Session::ephemeral();
        session.set_token("t1").unwrap();
        let ctx = context(&mock, session.clone()).await;

        logout(&ctx).unwrap();
        logout(&ctx).unwrap();
        assert_eq!(session.get_token(), None);
    }
}
