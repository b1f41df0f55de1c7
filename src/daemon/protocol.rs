//! Daemon protocol types for NDJSON communication over UNIX socket.
//!
//! CHANGELOG:
//! - 10/16/2026 - Add event lines for streamed messageReceived notifications
//! - 01/10/2026 - Initial implementation (Phase 4C)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::events::MESSAGE_RECEIVED;
use crate::message::Message;

/// Protocol version spoken by this daemon.
pub const PROTOCOL_VERSION: u8 = 1;

/// NDJSON request from client to daemon.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    /// Unique request ID (UUID)
    pub id: String,
    /// Protocol version (currently 1)
    pub v: u8,
    /// Method name (e.g., "health", "getMessages", "startListening")
    pub method: String,
    /// Method parameters (flexible key-value map)
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

/// NDJSON response from daemon to client.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    /// Request ID (matches request)
    pub id: String,
    /// Success flag
    pub ok: bool,
    /// Result data (if successful)
    pub result: Option<serde_json::Value>,
    /// Error information (if failed)
    pub error: Option<ErrorInfo>,
    /// Response metadata
    pub meta: ResponseMeta,
}

/// Error details in response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (e.g., "PERMISSION_DENIED", "INVALID_ARGUMENT")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    pub details: Option<serde_json::Value>,
}

/// Response metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Server execution time in milliseconds
    pub server_ms: f64,
    /// Protocol version
    pub protocol_v: u8,
}

/// Pushed to `subscribe` connections, one line per matched message.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventLine {
    pub event: String,
    pub data: Message,
}

impl Request {
    /// Parse request from NDJSON line.
    pub fn from_ndjson_line(line: &str) -> Result<Self> {
        serde_json::from_str(line).context("Failed to parse request JSON")
    }
}

impl Response {
    /// Create a success response.
    pub fn success(id: String, result: serde_json::Value, server_ms: f64) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
            meta: ResponseMeta {
                server_ms,
                protocol_v: PROTOCOL_VERSION,
            },
        }
    }

    /// Create an error response.
    pub fn error(id: String, code: &str, message: String, server_ms: f64) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(ErrorInfo {
                code: code.to_string(),
                message,
                details: None,
            }),
            meta: ResponseMeta {
                server_ms,
                protocol_v: PROTOCOL_VERSION,
            },
        }
    }

    /// Serialize response to NDJSON line.
    pub fn to_ndjson_line(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

impl EventLine {
    pub fn message_received(message: Message) -> Self {
        Self {
            event: MESSAGE_RECEIVED.to_string(),
            data: message,
        }
    }

    pub fn to_ndjson_line(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_params() {
        let req = Request::from_ndjson_line(r#"{"id":"a","v":1,"method":"stopListening"}"#).unwrap();
        assert_eq!(req.method, "stopListening");
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_error_response_line() {
        let line = Response::error("a".into(), "PERMISSION_DENIED", "SMS permission not granted".into(), 0.5)
            .to_ndjson_line()
            .unwrap();
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["ok"], serde_json::json!(false));
        assert_eq!(value["error"]["code"], serde_json::json!("PERMISSION_DENIED"));
    }

    #[test]
    fn test_event_line() {
        let line = EventLine::message_received(Message::live(Some("KCB".into()), None, 9))
            .to_ndjson_line()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["event"], serde_json::json!("messageReceived"));
        assert_eq!(value["data"]["id"], serde_json::json!("9"));
    }
}
