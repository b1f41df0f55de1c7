//! Reader configuration loaded from JSON.
//!
//! Lookup order:
//! 1. SMS_READER_CONFIG env var
//! 2. ~/.sms-reader/config.json
//!
//! A missing file means defaults. SMS_READER_DB overrides `db_path`.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::connection;
use crate::db::query::DEFAULT_LIMIT;

/// Financial senders monitored when the user has not customised the list.
pub const DEFAULT_SENDERS: &[&str] = &[
    "MPESA",        // Kenya M-PESA
    "KCB",          // KCB Bank Kenya
    "EQUITY",       // Equity Bank Kenya
    "COOP",         // Co-operative Bank Kenya
    "ABSA",         // ABSA Bank Kenya
    "STANBIC",      // Stanbic Bank Kenya
    "DTB",          // Diamond Trust Bank Kenya
    "NCBA",         // NCBA Bank Kenya
    "FAMILY",       // Family Bank Kenya
    "I&M",          // I&M Bank Kenya
    "GTBANK",       // GTBank Nigeria
    "FIRSTBANK",    // First Bank Nigeria
    "ACCESS",       // Access Bank Nigeria
    "UBA",          // UBA Nigeria
    "ZENITH",       // Zenith Bank Nigeria
    "FNB",          // FNB South Africa
    "STANDARDBANK", // Standard Bank South Africa
    "CAPITEC",      // Capitec South Africa
    "NEDBANK",      // Nedbank South Africa
];

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sms-reader")
}

/// Default config.json path.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("SMS_READER_CONFIG") {
        return PathBuf::from(shellexpand::tilde(&path).to_string());
    }
    config_dir().join("config.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inbox database (`~` allowed)
    pub db_path: String,
    /// Senders used when a command does not name any
    pub senders: Vec<String>,
    pub default_limit: u32,
    /// How far back a scan reaches when no `since` is given
    pub initial_scan_days: u32,
    pub poll_interval_ms: u64,
    pub socket_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: connection::default_db_path().to_string_lossy().to_string(),
            senders: DEFAULT_SENDERS.iter().map(|s| s.to_string()).collect(),
            default_limit: DEFAULT_LIMIT,
            initial_scan_days: 30,
            poll_interval_ms: 1000,
            socket_path: config_dir().join("daemon.sock").to_string_lossy().to_string(),
        }
    }
}

impl Config {
    /// Load from a file. A missing file yields defaults; a malformed one is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            serde_json::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config JSON: {:?}", path))?
        } else {
            tracing::debug!(?path, "no config file, using defaults");
            Config::default()
        };

        if let Ok(db) = std::env::var("SMS_READER_DB") {
            config.db_path = db;
        }
        Ok(config)
    }

    /// Load from the default location.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.db_path).to_string())
    }

    pub fn socket_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.socket_path).to_string())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_limit, 100);
        assert_eq!(config.initial_scan_days, 30);
        assert!(config.senders.iter().any(|s| s == "MPESA"));
        assert_eq!(config.senders.len(), DEFAULT_SENDERS.len());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"senders": ["KCB"], "default_limit": 20}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.senders, vec!["KCB".to_string()]);
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.poll_interval_ms, 1000);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config.default_limit, 100);
    }

    #[test]
    fn test_tilde_expansion() {
        let config = Config {
            db_path: "~/inbox.db".to_string(),
            ..Config::default()
        };
        assert!(!config.db_path().to_string_lossy().starts_with('~'));
    }
}
