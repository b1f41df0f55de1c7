//! Database module: query construction and store adapters for the SMS inbox.
//!
//! CHANGELOG:
//! - 10/16/2026 - Sender-filtered inbox queries and store adapters
//! - 01/10/2026 - Initial module structure

pub mod connection;
pub mod query;
pub mod store;
