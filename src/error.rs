//! Error taxonomy for host-facing operations.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use thiserror::Error;

/// Errors surfaced to the caller of a reader operation.
///
/// Collaborator unregister failures are not represented here; the listener
/// swallows them (see `broadcast::BroadcastError`).
#[derive(Error, Debug)]
pub enum SmsError {
    #[error("SMS permission not granted")]
    PermissionDenied,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Error reading messages: {0}")]
    StoreQuery(#[from] rusqlite::Error),

    #[error("Error reading messages: {0}")]
    Store(String),

    #[error("Error starting listener: {0}")]
    Subscribe(String),
}

impl SmsError {
    /// Empty sender list, checked before any side effect.
    pub fn no_senders() -> Self {
        SmsError::InvalidArgument("No senders specified".to_string())
    }

    /// Stable wire code used by the daemon protocol.
    pub fn code(&self) -> &'static str {
        match self {
            SmsError::PermissionDenied => "PERMISSION_DENIED",
            SmsError::InvalidArgument(_) => "INVALID_ARGUMENT",
            SmsError::StoreQuery(_) | SmsError::Store(_) => "STORE_QUERY_FAILED",
            SmsError::Subscribe(_) => "SUBSCRIBE_FAILED",
        }
    }
}

pub type Result<T> = std::result::Result<T, SmsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_host_bridge() {
        assert_eq!(SmsError::PermissionDenied.to_string(), "SMS permission not granted");
        assert_eq!(SmsError::no_senders().to_string(), "No senders specified");
        assert_eq!(
            SmsError::Store("disk I/O".to_string()).to_string(),
            "Error reading messages: disk I/O"
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(SmsError::PermissionDenied.code(), "PERMISSION_DENIED");
        assert_eq!(SmsError::no_senders().code(), "INVALID_ARGUMENT");
        assert_eq!(
            SmsError::StoreQuery(rusqlite::Error::QueryReturnedNoRows).code(),
            "STORE_QUERY_FAILED"
        );
    }
}
