//! Session management for the affiliate dashboard.
//!
//! This module provides:
//! - `Session`: a cloneable handle to the single stored bearer token
//! - `TokenSlot`: the persistence seam behind it, with file, keychain and
//!   in-memory backends
//!
//! There is no expiry or refresh model. A revoked token simply makes the
//! next request fail with an authorization error.

pub mod session;
pub mod slot;

pub use session::Session;
pub use slot::{FileSlot, KeyringSlot, MemorySlot, TokenSlot, TOKEN_KEY};
