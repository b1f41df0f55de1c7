//! Message records returned to the host.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use serde::{Deserialize, Serialize};

/// A stored or freshly delivered text message.
///
/// `id` is the store row identifier for historical messages and the arrival
/// timestamp for live ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub address: Option<String>,
    pub body: Option<String>,
    /// Unix milliseconds
    #[serde(rename = "date")]
    pub timestamp_millis: i64,
    pub read: bool,
}

impl Message {
    /// Build the event emitted for a live message. Live messages are always unread.
    pub fn live(address: Option<String>, body: Option<String>, timestamp_millis: i64) -> Self {
        Self {
            id: timestamp_millis.to_string(),
            address,
            body,
            timestamp_millis,
            read: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_message_id_from_timestamp() {
        let msg = Message::live(Some("MPESA".into()), Some("Confirmed".into()), 1_767_225_600_000);
        assert_eq!(msg.id, "1767225600000");
        assert!(!msg.read);
    }

    #[test]
    fn test_wire_shape() {
        let msg = Message::live(Some("KCB".into()), None, 42);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "42",
                "address": "KCB",
                "body": null,
                "date": 42,
                "read": false,
            })
        );
    }
}
