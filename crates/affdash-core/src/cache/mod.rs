//! Client-side freshness tracking for dashboard queries.
//!
//! Nothing is persisted: each screen visit refetches whatever has outlived
//! its staleness window (15 seconds for the snapshot, 30 for the lists).

pub mod query;

pub use query::{needs_fetch, CachedData, Query};
