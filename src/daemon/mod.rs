//! Daemon mode implementation: persistent server with hot resources.
//!
//! CHANGELOG:
//! - 10/16/2026 - Serve sms reader operations
//! - 01/10/2026 - Initial module structure (Phase 4C)

pub mod protocol;
pub mod server;
pub mod service;
