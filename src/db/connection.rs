//! SQLite connection management for the SMS inbox database.
//!
//! CHANGELOG:
//! - 10/16/2026 - Take the inbox path from config instead of a fixed location
//! - 01/10/2026 - Initial stub

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Default inbox database path.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sms-reader")
        .join("inbox.db")
}

/// Open a read-only connection to the inbox database.
pub fn open_db(db_path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        db_path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open SMS inbox database at {:?}", db_path))
}

/// Check if the inbox database can be opened and read.
pub fn check_access(db_path: &Path) -> bool {
    open_db(db_path)
        .and_then(|conn| {
            conn.query_row("SELECT COUNT(*) FROM sms LIMIT 1", [], |row| row.get::<_, i64>(0))
                .context("Inbox table not readable")
        })
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_db_path() {
        let path = default_db_path();
        assert!(path.ends_with(".sms-reader/inbox.db"));
    }

    #[test]
    fn test_check_access_missing_file() {
        let path = std::env::temp_dir().join("sms-reader-missing-inbox-does-not-exist.db");
        assert!(!check_access(&path));
    }
}
