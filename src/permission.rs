//! Permission gate for SMS access.
//!
//! The grant itself lives outside this crate; providers report it and run the
//! request flow. Every reader operation except the permission calls and
//! `stop_listening` goes through `PermissionGate::ensure_granted` first.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::db::connection;
use crate::error::{Result, SmsError};

/// Capability state as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionState {
    #[serde(rename = "granted")]
    Granted,
    #[serde(rename = "denied")]
    Denied,
    /// Not decided yet; a request will prompt.
    #[serde(rename = "prompt")]
    Prompting,
}

impl PermissionState {
    /// Wire name, as reported to the host.
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Prompting => "prompt",
        }
    }
}

/// External permission subsystem.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Current state, without side effects.
    fn state(&self) -> PermissionState;

    /// Run the request flow and resolve with the resulting state.
    async fn request(&self) -> PermissionState;
}

/// Wraps a provider and turns a missing grant into `SmsError::PermissionDenied`.
#[derive(Clone)]
pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn PermissionProvider>) -> Self {
        Self { provider }
    }

    pub fn check_state(&self) -> PermissionState {
        self.provider.state()
    }

    pub async fn request_state(&self) -> PermissionState {
        let state = self.provider.request().await;
        tracing::info!(?state, "permission request completed");
        state
    }

    /// Fail unless the grant is in place.
    pub fn ensure_granted(&self) -> Result<()> {
        match self.check_state() {
            PermissionState::Granted => Ok(()),
            state => {
                tracing::debug!(?state, "operation rejected: permission not granted");
                Err(SmsError::PermissionDenied)
            }
        }
    }
}

// ============================================================================
// Providers
// ============================================================================

/// Provider with a fixed state and a fixed prompt outcome.
///
/// Used by hosts that manage the grant themselves and by tests.
pub struct StaticPermissions {
    state: RwLock<PermissionState>,
    prompt_outcome: PermissionState,
}

impl StaticPermissions {
    pub fn new(state: PermissionState) -> Self {
        Self {
            state: RwLock::new(state),
            prompt_outcome: state,
        }
    }

    /// State the provider moves to when a request prompts.
    pub fn with_prompt_outcome(mut self, outcome: PermissionState) -> Self {
        self.prompt_outcome = outcome;
        self
    }

    pub fn set(&self, state: PermissionState) {
        *self.state.write() = state;
    }
}

#[async_trait]
impl PermissionProvider for StaticPermissions {
    fn state(&self) -> PermissionState {
        *self.state.read()
    }

    async fn request(&self) -> PermissionState {
        let mut state = self.state.write();
        if *state == PermissionState::Prompting {
            *state = self.prompt_outcome;
        }
        *state
    }
}

/// Derives the grant from filesystem access to the inbox database.
///
/// Missing file: `Prompting` (not provisioned yet). Present but unreadable:
/// `Denied`. Readable: `Granted`.
pub struct InboxAccess {
    db_path: PathBuf,
}

impl InboxAccess {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

#[async_trait]
impl PermissionProvider for InboxAccess {
    fn state(&self) -> PermissionState {
        if !self.db_path.exists() {
            PermissionState::Prompting
        } else if connection::check_access(&self.db_path) {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }

    async fn request(&self) -> PermissionState {
        // No interactive prompt for file access; the request re-reads the grant.
        self.state()
    }
}
