//! Millisecond timestamp helpers.
//!
//! CHANGELOG:
//! - 10/16/2026 - Unix millisecond helpers

use chrono::{DateTime, TimeZone, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Unix milliseconds for `days` days before now (never negative).
pub fn days_ago_millis(days: u32) -> i64 {
    (now_millis() - days as i64 * MILLIS_PER_DAY).max(0)
}

/// Convert Unix milliseconds to an RFC 3339 string.
pub fn millis_to_iso(millis: i64) -> Option<String> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt: DateTime<Utc>| dt.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_to_iso() {
        // 2025-01-01 00:00:00 UTC
        let iso = millis_to_iso(1_735_689_600_000).unwrap();
        assert!(iso.starts_with("2025-01-01"));
    }

    #[test]
    fn test_days_ago() {
        let now = now_millis();
        let week = days_ago_millis(7);
        let diff = now - week;
        assert!(diff >= 7 * MILLIS_PER_DAY && diff < 7 * MILLIS_PER_DAY + 5_000);
        assert_eq!(days_ago_millis(u32::MAX), 0);
    }
}
