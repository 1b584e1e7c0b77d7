use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use tracing::{debug, warn};

use super::slot::{FileSlot, KeyringSlot, MemorySlot, TokenSlot};
use crate::config::TokenStorage;

#[derive(Debug, Clone)]
enum TokenState {
    /// Slot not read yet
    Unloaded,
    Loaded(Option<String>),
}

/// Handle to the single stored token.
///
/// Cheap to clone; every clone sees the same token. The handle is passed
/// explicitly to `ApiClient::new` and to whatever screen logs in or out.
/// The slot is read lazily on the first `get_token`.
#[derive(Clone)]
pub struct Session {
    state: Arc<RwLock<TokenState>>,
    slot: Arc<dyn TokenSlot>,
}

impl Session {
    pub fn new(slot: Arc<dyn TokenSlot>) -> Self {
        Self {
            state: Arc::new(RwLock::new(TokenState::Unloaded)),
            slot,
        }
    }

    /// Session backed by the configured persistent slot.
    pub fn open(storage: TokenStorage, data_dir: &Path) -> Self {
        match storage {
            TokenStorage::File => Self::new(Arc::new(FileSlot::new(data_dir))),
            TokenStorage::Keyring => Self::new(Arc::new(KeyringSlot::new())),
        }
    }

    /// Session that forgets its token when the process exits.
    pub fn ephemeral() -> Self {
        Self::new(Arc::new(MemorySlot::new()))
    }

    /// The stored token, or `None` when none is set or the slot is unreadable.
    pub fn get_token(&self) -> Option<String> {
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let TokenState::Loaded(ref token) = *state {
                return token.clone();
            }
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let TokenState::Loaded(ref token) = *state {
            return token.clone();
        }
        let token = match self.slot.read() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token, treating session as signed out");
                None
            }
        };
        debug!(present = token.is_some(), "Token slot loaded");
        *state = TokenState::Loaded(token.clone());
        token
    }

    /// Store a token, replacing any previous one.
    ///
    /// The in-memory value is updated even when persisting fails, so the
    /// current process stays signed in.
    pub fn set_token(&self, token: &str) -> Result<()> {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = TokenState::Loaded(Some(token.to_string()));
        }
        self.slot.write(token)
    }

    /// Forget the token. Calling this when signed out is a no-op.
    pub fn clear_token(&self) -> Result<()> {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = TokenState::Loaded(None);
        }
        self.slot.remove()
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the token itself
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
