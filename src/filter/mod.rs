//! Sender filtering: normalized sender patterns and partial matching.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial module structure

pub mod matcher;

pub use matcher::{matches, SenderSet};
