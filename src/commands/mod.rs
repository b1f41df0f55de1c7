//! Command implementations.
//!
//! CHANGELOG:
//! - 10/16/2026 - permissions, messages, listen, senders
//! - 01/10/2026 - Initial module structure

pub mod inbox;
pub mod live;
pub mod permissions;
