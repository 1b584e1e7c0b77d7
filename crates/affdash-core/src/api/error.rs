use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// The single error kind raised by the API client.
///
/// `Display` is the message shown to the user: the server's `error` field when
/// it sent one, otherwise a generic message carrying the status code.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Error body shape the affiliate API uses for failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl ApiError {
    /// Build the error for a non-success response from its raw body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Request failed: {}", status.as_u16()));
        ApiError::Http { status, message }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }

    /// True for 401/403 responses. Callers treat these as "sign in again".
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }
}
