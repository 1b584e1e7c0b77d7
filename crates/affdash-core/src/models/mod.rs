//! Data models for the affiliate API.
//!
//! - `DashboardData`: stats snapshot and affiliate identity
//! - `Conversion`, `Payout`: list items, wrapped in `Page`
//! - `LoginRequest`, `RegisterRequest`, `AuthResponse`: auth payloads
//! - `Pence`: integer minor-unit money
//! - `Validate`: post-parse shape checks

pub mod activity;
pub mod auth;
pub mod dashboard;
pub mod money;
pub mod validate;

pub use activity::{Conversion, ConversionStatus, EventType, Page, Payout, PayoutStatus};
pub use auth::{AuthResponse, LoginRequest, RegisterRequest};
pub use dashboard::{Affiliate, DashboardData, DashboardStats};
pub use money::Pence;
pub use validate::Validate;
