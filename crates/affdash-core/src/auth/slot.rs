use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};

/// Fixed name of the one persisted slot holding the token.
pub const TOKEN_KEY: &str = "aff_token";

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Keychain service name
const SERVICE_NAME: &str = "affdash";

/// Persistent storage for exactly one token.
pub trait TokenSlot: Send + Sync {
    fn read(&self) -> Result<Option<String>>;
    fn write(&self, token: &str) -> Result<()>;
    /// Removing an absent token is not an error.
    fn remove(&self) -> Result<()>;
}

// ============================================================================
// File
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    #[serde(rename = "aff_token")]
    token: String,
    saved_at: DateTime<Utc>,
}

/// Token stored as `session.json` in the data directory.
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenSlot for FileSlot {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read session file")?;
        let file: SessionFile =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(file.token))
    }

    fn write(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = SessionFile {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

// ============================================================================
// OS keychain
// ============================================================================

/// Token stored in the OS keychain.
///
/// Needs a platform keychain backend (macOS Keychain, Windows Credential
/// Manager or the Secret Service on Linux).
pub struct KeyringSlot {
    service: String,
}

impl KeyringSlot {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Keychain entry under a different service name.
    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, TOKEN_KEY).context("Failed to create keyring entry")
    }
}

impl Default for KeyringSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSlot for KeyringSlot {
    fn read(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read token from keychain"),
        }
    }

    fn write(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn remove(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Non-persistent slot.
#[derive(Default)]
pub struct MemorySlot {
    token: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>> {
        let guard = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("memory slot poisoned"))?;
        Ok(guard.clone())
    }

    fn write(&self, token: &str) -> Result<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("memory slot poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("memory slot poisoned"))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_slot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path());

        assert_eq!(slot.read().unwrap(), None);
        slot.write("abc123").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("abc123"));

        let raw = std::fs::read_to_string(slot.path()).unwrap();
        assert!(raw.contains("\"aff_token\": \"abc123\""));
    }

    #[test]
    fn test_file_slot_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(&dir.path().join("nested").join("affdash"));
        slot.write("t").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("t"));
    }

    #[test]
    fn test_file_slot_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path());
        slot.write("abc").unwrap();
        slot.remove().unwrap();
        slot.remove().unwrap();
        assert_eq!(slot.read().unwrap(), None);
    }

    #[test]
    fn test_file_slot_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path());
        std::fs::write(slot.path(), "not json").unwrap();
        assert!(slot.read().is_err());
    }

    #[test]
    fn test_memory_slot() {
        let slot = MemorySlot::with_token("x");
        assert_eq!(slot.read().unwrap().as_deref(), Some("x"));
        slot.remove().unwrap();
        assert_eq!(slot.read().unwrap(), None);
    }

    #[test]
    #[ignore = "needs an unlocked OS keychain"]
    fn test_keyring_slot_persists_across_instances() {
        let service = "affdash-test";
        KeyringSlot::with_service(service).write("t1").unwrap();

        // A fresh slot reads the stored entry back
        let reopened = KeyringSlot::with_service(service);
        assert_eq!(reopened.read().unwrap().as_deref(), Some("t1"));

        reopened.remove().unwrap();
        reopened.remove().unwrap();
        assert_eq!(KeyringSlot::with_service(service).read().unwrap(), None);
    }
}
