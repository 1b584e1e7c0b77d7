//! Full-screen views.

pub mod auth;
pub mod dashboard;
