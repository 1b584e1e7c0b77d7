//! Core library for affdash.
//!
//! - `auth`: the session token store
//! - `api`: the authenticated JSON client and its error type
//! - `models`: response and request shapes
//! - `cache`: staleness windows for dashboard queries
//! - `config`: config file, base URL resolution, data directory
//! - `utils`: display formatting

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod utils;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use api::{ApiClient, ApiError, RequestOptions};
pub use auth::Session;
pub use config::Config;
