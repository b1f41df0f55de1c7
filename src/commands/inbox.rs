//! Inbox commands: messages, senders.
//!
//! CHANGELOG:
//! - 10/16/2026 - Sender-filtered retrieval replaces contact/recent reading commands

use anyhow::Result;
use sms_reader::config::Config;
use sms_reader::message::Message;
use sms_reader::output::OutputControls;
use sms_reader::reader::{GetMessagesOptions, SmsReader};
use sms_reader::time;

/// Lower bound for a scan: explicit `--since` wins, then `--days`, then the
/// configured initial scan window. Zero days means no bound.
pub fn resolve_since(since: Option<i64>, days: Option<u32>, config: &Config) -> i64 {
    if let Some(since) = since {
        return since;
    }
    match days.unwrap_or(config.initial_scan_days) {
        0 => 0,
        days => time::days_ago_millis(days),
    }
}

/// Stored messages from the given senders (the configured whitelist when none are given).
pub fn messages(
    config: &Config,
    senders: Vec<String>,
    limit: Option<u32>,
    since: Option<i64>,
    days: Option<u32>,
    output: &OutputControls,
) -> Result<()> {
    let senders = if senders.is_empty() {
        config.senders.clone()
    } else {
        senders
    };

    let options = GetMessagesOptions {
        senders,
        limit: limit.map(i64::from),
        since: resolve_since(since, days, config),
    };

    let reader = SmsReader::from_config(config);
    let result = reader.get_messages(&options)?;

    if output.json {
        output.print(&result);
    } else {
        if result.messages.is_empty() {
            println!("No messages found.");
            return Ok(());
        }

        println!("Messages ({}):", result.messages.len());
        println!("{}", "-".repeat(60));
        for msg in &result.messages {
            println!("{}", summary_line(msg));
        }
    }

    Ok(())
}

/// Configured sender whitelist.
pub fn senders(config: &Config, output: &OutputControls) -> Result<()> {
    if output.json {
        output.print(&serde_json::json!({ "senders": config.senders }));
    } else {
        println!("Senders ({}):", config.senders.len());
        for sender in &config.senders {
            println!("  {}", sender);
        }
    }
    Ok(())
}

/// One-line human rendering of a message.
pub fn summary_line(msg: &Message) -> String {
    let date = time::millis_to_iso(msg.timestamp_millis).unwrap_or_default();
    let sender = msg.address.as_deref().unwrap_or("unknown");
    let preview: String = msg.body.as_deref().unwrap_or("").chars().take(80).collect();
    format!("[{}] {}: {}", date, sender, preview)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_since() {
        let config = Config::default();
        assert_eq!(resolve_since(Some(42), Some(7), &config), 42);
        assert_eq!(resolve_since(None, Some(0), &config), 0);

        let thirty_days = resolve_since(None, None, &config);
        assert!(thirty_days > 0);
        assert!(resolve_since(None, Some(1), &config) > thirty_days);
    }

    #[test]
    fn test_summary_line() {
        let msg = Message {
            id: "1".to_string(),
            address: None,
            body: Some("Confirmed. Ksh1,000 received".to_string()),
            timestamp_millis: 1_735_689_600_000,
            read: true,
        };
        let line = summary_line(&msg);
        assert!(line.starts_with("[2025-01-01"));
        assert!(line.contains("unknown: Confirmed."));
    }
}
