//! API client for the affiliate tracking service.
//!
//! `ApiClient::request` is the one place requests are built: it sets the JSON
//! content type, signs the request with the stored token when there is one,
//! and turns non-success responses into an `ApiError`. The typed endpoint
//! methods below it add schema checks on the parsed response.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::Session;
use crate::models::{
    AuthResponse, Conversion, DashboardData, LoginRequest, Page, Payout, RegisterRequest, Validate,
};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds, enforced by the transport.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("affdash/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Request options
// ============================================================================

/// Method, body and extra headers for a single request. Defaults to a bare GET.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// Pre-encoded JSON body
    pub body: Option<String>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    /// A request with `body` encoded as JSON.
    pub fn json<B: Serialize>(method: Method, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_string(body).map_err(ApiError::Encode)?;
        Ok(Self {
            method,
            body: Some(body),
            headers: HeaderMap::new(),
        })
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

// ============================================================================
// Client
// ============================================================================

/// Client for the affiliate API.
/// Clone is cheap - reqwest::Client and Session are both Arc-backed.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    session: Session,
}

impl ApiClient {
    /// Create a client that signs requests with whatever token `session` holds.
    pub fn new(base_url: &str, session: Session) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Caller headers, then the fixed content type, then the bearer token if
    /// one is stored. Later entries win.
    fn build_headers(&self, mut headers: HeaderMap) -> Result<HeaderMap, ApiError> {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(token) = self.session.get_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ApiError::InvalidHeader("stored token is not a valid header value".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Issue a request and parse the JSON response as `T`.
    ///
    /// The response shape is trusted; use the typed endpoint methods when the
    /// result is going to be rendered.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let headers = self.build_headers(options.headers)?;
        debug!(method = %options.method, path, "Sending API request");

        let mut builder = self.client.request(options.method, &url).headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status, &body);
            warn!(status = status.as_u16(), path, error = %err, "API request failed");
            return Err(err);
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    /// `request` followed by a `Validate` pass on the parsed value.
    pub async fn request_validated<T: DeserializeOwned + Validate>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let value: T = self.request(path, options).await?;
        value.validate().map_err(|e| {
            warn!(path, error = %e, "API response failed validation");
            ApiError::InvalidResponse(format!("{}: {}", path, e))
        })?;
        Ok(value)
    }

    // ===== Auth =====

    /// Exchange credentials for a token. Does not store it.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let options = RequestOptions::json(Method::POST, credentials)?;
        self.request_validated("/auth/login", options).await
    }

    /// Create an affiliate account and get its token. Does not store it.
    pub async fn register(&self, registration: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let options = RequestOptions::json(Method::POST, registration)?;
        self.request_validated("/auth/register", options).await
    }

    // ===== Dashboard =====

    pub async fn fetch_dashboard(&self) -> Result<DashboardData, ApiError> {
        self.request_validated("/dashboard", RequestOptions::get()).await
    }

    /// Most recent conversions, in server order.
    pub async fn fetch_conversions(&self, limit: usize) -> Result<Vec<Conversion>, ApiError> {
        let path = format!("/conversions?limit={}", limit);
        let page: Page<Conversion> = self.request_validated(&path, RequestOptions::get()).await?;
        Ok(page.items)
    }

    /// Most recent payouts, in server order.
    pub async fn fetch_payouts(&self, limit: usize) -> Result<Vec<Payout>, ApiError> {
        let path = format!("/payouts?limit={}", limit);
        let page: Page<Payout> = self.request_validated(&path, RequestOptions::get()).await?;
        Ok(page.items)
    }
}
