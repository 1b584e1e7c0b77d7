//! REST client for the affiliate tracking API.
//!
//! JSON over HTTP(S) with bearer-token authentication. The token comes from
//! the `Session` handed to `ApiClient::new`.

pub mod client;
pub mod error;

pub use client::{ApiClient, RequestOptions};
pub use error::ApiError;
