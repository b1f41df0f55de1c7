//! Case-insensitive partial sender matching.
//!
//! Sender short codes arrive in many shapes ("MPESA", "M-PESA", "MyBank-Alert"),
//! so a pattern matches when it is contained in the address, not equal to it.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use serde::{Serialize, Serializer};

/// Normalize a sender pattern or address for comparison.
///
/// ASCII-only folding, matching SQLite's built-in `UPPER()`. Non-ASCII letters
/// are left as-is, so "é" and "É" are different senders here, unlike a full
/// Unicode uppercase.
pub fn normalize(value: &str) -> String {
    value.to_ascii_uppercase()
}

/// Ordered, de-duplicated set of uppercase sender patterns.
///
/// Insertion order is kept so that query parameters bind in the order the
/// caller supplied them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderSet {
    patterns: Vec<String>,
}

impl SenderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pattern. Every pattern is kept, blank ones included (an empty
    /// pattern matches any address); duplicates (after normalization) keep
    /// their first position.
    pub fn insert(&mut self, pattern: &str) -> bool {
        let normalized = normalize(pattern);
        if self.patterns.contains(&normalized) {
            return false;
        }
        self.patterns.push(normalized);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for SenderSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SenderSet::new();
        for pattern in iter {
            set.insert(pattern.as_ref());
        }
        set
    }
}

impl Serialize for SenderSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.patterns.serialize(serializer)
    }
}

/// True if any pattern in `filter` is contained in the normalized `address`.
pub fn matches(address: Option<&str>, filter: &SenderSet) -> bool {
    let address = match address {
        Some(a) => a,
        None => return false,
    };
    if filter.is_empty() {
        return false;
    }

    let normalized = normalize(address);
    filter.iter().any(|pattern| normalized.contains(pattern))
}
