//! Compound sender/date query construction.
//!
//! A `Query` is turned into a `StoreQuery`: a structured selection that can be
//! rendered as a parameterised SQL clause or evaluated in memory, plus the
//! sort order and row cap. Nothing here touches a store.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use crate::error::{Result, SmsError};
use crate::filter::{self, SenderSet};
use crate::message::Message;

/// Default row cap when the caller gives none.
pub const DEFAULT_LIMIT: u32 = 100;

/// Sort order applied to every retrieval.
pub const ORDER_BY_DATE_DESC: &str = "date DESC";

/// Validated retrieval request.
#[derive(Debug, Clone)]
pub struct Query {
    senders: SenderSet,
    since_millis: i64,
    limit: u32,
}

impl Query {
    /// Validate a request. `since_millis == 0` means no lower date bound.
    pub fn new(senders: SenderSet, since_millis: i64, limit: i64) -> Result<Self> {
        if senders.is_empty() {
            return Err(SmsError::no_senders());
        }
        if since_millis < 0 {
            return Err(SmsError::InvalidArgument(format!(
                "since must be >= 0 (got {})",
                since_millis
            )));
        }
        if limit <= 0 || limit > u32::MAX as i64 {
            return Err(SmsError::InvalidArgument(format!(
                "limit must be positive (got {})",
                limit
            )));
        }

        Ok(Self {
            senders,
            since_millis,
            limit: limit as u32,
        })
    }

    pub fn senders(&self) -> &SenderSet {
        &self.senders
    }

    pub fn since_millis(&self) -> i64 {
        self.since_millis
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// A positional query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Integer(i64),
    Text(String),
}

/// Boolean predicate over the store's `address` and `date` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    since: Option<i64>,
    patterns: Vec<String>,
}

impl Selection {
    /// Render as a SQL `WHERE` body with `?` placeholders.
    ///
    /// The date bound, when present, is the first placeholder.
    pub fn clause(&self) -> String {
        let senders = self
            .patterns
            .iter()
            .map(|_| r"UPPER(address) LIKE ? ESCAPE '\'")
            .collect::<Vec<_>>()
            .join(" OR ");

        match self.since {
            Some(_) => format!("date > ? AND ({})", senders),
            None => format!("({})", senders),
        }
    }

    /// Parameters in placeholder order.
    pub fn parameters(&self) -> Vec<Param> {
        let mut params = Vec::with_capacity(self.patterns.len() + 1);
        if let Some(since) = self.since {
            params.push(Param::Integer(since));
        }
        params.extend(
            self.patterns
                .iter()
                .map(|p| Param::Text(format!("%{}%", escape_like(p)))),
        );
        params
    }

    /// Evaluate the predicate against a message without a SQL engine.
    pub fn evaluate(&self, message: &Message) -> bool {
        if let Some(since) = self.since {
            if message.timestamp_millis <= since {
                return false;
            }
        }
        let address = match message.address.as_deref() {
            Some(a) => filter::matcher::normalize(a),
            None => return false,
        };
        self.patterns.iter().any(|p| address.contains(p.as_str()))
    }
}

/// Everything a store needs to execute a retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    pub selection: Selection,
    pub order_by: &'static str,
    pub limit: u32,
}

/// Build the store query for a validated request.
pub fn build(query: &Query) -> StoreQuery {
    let since = (query.since_millis > 0).then_some(query.since_millis);

    StoreQuery {
        selection: Selection {
            since,
            patterns: query.senders.iter().map(str::to_string).collect(),
        },
        order_by: ORDER_BY_DATE_DESC,
        limit: query.limit,
    }
}

/// Escape LIKE wildcards so patterns match literally.
fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
