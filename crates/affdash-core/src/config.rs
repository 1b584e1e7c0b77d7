//! Application configuration management.
//!
//! Configuration is stored at `~/.config/affdash/config.json` and holds the
//! API base URL, the referral tracking base URL, the last email used to sign
//! in, where the session token is persisted, and the list page size.
//!
//! The `AFFILIATE_API_URL` environment variable (also read from `.env`)
//! overrides the configured API base URL.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "affdash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "AFFILIATE_API_URL";

/// Local development endpoint used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8085";

/// Items requested per conversions/payouts page
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Where the session token is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub track_base_url: Option<String>,
    pub last_email: Option<String>,
    #[serde(default)]
    pub token_storage: TokenStorage,
    pub list_limit: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `~/.config/affdash/config.json` on Linux; platform equivalent elsewhere.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the session file and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// API base URL: environment, then config file, then the local default.
    pub fn api_base_url(&self) -> String {
        resolve_base_url(std::env::var(API_URL_ENV).ok(), self.api_base_url.as_deref())
    }

    /// Base URL referral links point at. Defaults to the API base URL.
    pub fn track_base_url(&self) -> String {
        match self.track_base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => self.api_base_url(),
        }
    }

    pub fn list_limit(&self) -> usize {
        match self.list_limit {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_LIST_LIMIT,
        }
    }
}

/// Pick the first non-empty base URL and strip any trailing slash.
pub fn resolve_base_url(env_value: Option<String>, configured: Option<&str>) -> String {
    let chosen = env_value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| configured.map(str::trim).filter(|s| !s.is_empty()))
        .unwrap_or(DEFAULT_API_BASE_URL);
    chosen.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_base_url_precedence() {
        assert_eq!(
            resolve_base_url(Some("https://api.example.com".into()), Some("http://cfg")),
            "https://api.example.com"
        );
        assert_eq!(resolve_base_url(None, Some("http://cfg:9000/")), "http://cfg:9000");
        assert_eq!(resolve_base_url(Some("  ".into()), None), DEFAULT_API_BASE_URL);
        assert_eq!(resolve_base_url(None, None), "http://localhost:8085");
    }

    #[test]
    fn test_list_limit_default() {
        let mut config = Config::default();
        assert_eq!(config.list_limit(), 20);
        config.list_limit = Some(0);
        assert_eq!(config.list_limit(), 20);
        config.list_limit = Some(50);
        assert_eq!(config.list_limit(), 50);
    }

    #[test]
    fn test_track_base_url_override() {
        let config = Config {
            track_base_url: Some("https://go.example.com/".into()),
            ..Default::default()
        };
        assert_eq!(config.track_base_url(), "https://go.example.com");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("affdash").join("config.json");

        assert!(Config::load_from(&path).unwrap().last_email.is_none());

        let config = Config {
            last_email: Some("a@b.com".into()),
            token_storage: TokenStorage::Keyring,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.last_email.as_deref(), Some("a@b.com"));
        assert_eq!(loaded.token_storage, TokenStorage::Keyring);
    }

    #[test]
    fn test_token_storage_defaults_to_file() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.token_storage, TokenStorage::File);
    }
}
