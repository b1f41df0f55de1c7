//! sms-reader library
//!
//! Sender-filtered retrieval of stored text messages and live delivery of new
//! ones. Exposes modules for use by the CLI, daemon and client binaries.
//!
//! CHANGELOG:
//! - 10/16/2026 - Reader core: filter, query, listener, events
//! - 01/10/2026 - Initial library structure (Phase 4C)

// Core modules
pub mod broadcast;
pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod events;
pub mod filter;
pub mod listener;
pub mod message;
pub mod output;
pub mod permission;
pub mod reader;
pub mod time;

pub use error::{Result, SmsError};
pub use filter::{matches, SenderSet};
pub use message::Message;
pub use permission::{PermissionProvider, PermissionState};
pub use reader::SmsReader;
