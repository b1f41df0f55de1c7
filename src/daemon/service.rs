//! Daemon service - dispatches requests to reader operations.
//!
//! Keeps the reader (inbox connection, listener registration) hot between requests.
//!
//! CHANGELOG:
//! - 10/16/2026 - Dispatch reader operations (permissions, getMessages, listening)
//! - 01/10/2026 - Initial implementation (Phase 4C)

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::message::Message;
use crate::reader::{GetMessagesOptions, SmsReader, StartListeningOptions};

/// Request-level failures that never reach the reader.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid params for {method}: {reason}")]
    InvalidParams { method: String, reason: String },
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::UnknownMethod(_) => "UNKNOWN_METHOD",
            DispatchError::InvalidParams { .. } => "INVALID_PARAMS",
        }
    }
}

/// Daemon service with hot resources.
pub struct DaemonService {
    reader: SmsReader,
    runtime: tokio::runtime::Runtime, // drives permission prompts
    started_at: String,               // ISO timestamp
}

impl DaemonService {
    pub fn new(config: &Config) -> Result<Self> {
        let reader = SmsReader::from_config(config);
        tracing::info!(db = %config.db_path().display(), "daemon service ready");
        Self::with_reader(reader)
    }

    pub fn with_reader(reader: SmsReader) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build daemon runtime")?;

        Ok(Self {
            reader,
            runtime,
            started_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Dispatch request to appropriate handler.
    pub fn dispatch(
        &self,
        method: &str,
        params: HashMap<String, serde_json::Value>,
    ) -> Result<serde_json::Value> {
        match method {
            "health" => self.health(),
            "checkPermissions" => to_json(self.reader.check_permissions()),
            "requestPermissions" => {
                to_json(self.runtime.block_on(self.reader.request_permissions()))
            }
            "getMessages" => {
                let options: GetMessagesOptions = parse_params(method, params)?;
                to_json(self.reader.get_messages(&options)?)
            }
            "startListening" => {
                let options: StartListeningOptions = parse_params(method, params)?;
                to_json(self.reader.start_listening(&options)?)
            }
            "stopListening" => to_json(self.reader.stop_listening()),
            _ => Err(DispatchError::UnknownMethod(method.to_string()).into()),
        }
    }

    /// `messageReceived` events for a streaming connection.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.reader.subscribe()
    }

    pub fn shutdown(&self) {
        self.reader.shutdown();
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    fn health(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "pid": std::process::id(),
            "started_at": self.started_at,
            "version": "v1",
            "listening": self.reader.is_listening(),
        }))
    }
}

fn parse_params<T: DeserializeOwned>(
    method: &str,
    params: HashMap<String, serde_json::Value>,
) -> Result<T> {
    let value = serde_json::Value::Object(params.into_iter().collect());
    serde_json::from_value(value).map_err(|e| {
        DispatchError::InvalidParams {
            method: method.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn to_json<T: serde::Serialize>(value: T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

/// Wire code for a dispatch failure.
pub fn error_code(error: &anyhow::Error) -> &'static str {
    if let Some(e) = error.downcast_ref::<crate::error::SmsError>() {
        e.code()
    } else if let Some(e) = error.downcast_ref::<DispatchError>() {
        e.code()
    } else {
        "ERROR"
    }
}
