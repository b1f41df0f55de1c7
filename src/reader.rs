//! `SmsReader`: the operations exposed to the host application.
//!
//! Retrieval: PermissionGate -> QueryBuilder -> MessageStore.
//! Listening: PermissionGate -> LiveListener -> EventHub.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::broadcast::{MessageBroadcast, StorePoller};
use crate::config::Config;
use crate::db::query::{self, Query, DEFAULT_LIMIT};
use crate::db::store::{MessageStore, SqliteStore};
use crate::error::Result;
use crate::events::{EventHub, ListenerHandle};
use crate::filter::SenderSet;
use crate::listener::LiveListener;
use crate::message::Message;
use crate::permission::{InboxAccess, PermissionGate, PermissionProvider, PermissionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionStatus {
    pub sms: PermissionState,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetMessagesOptions {
    #[serde(default)]
    pub senders: Vec<String>,
    /// Row cap; the reader's default when absent
    #[serde(default)]
    pub limit: Option<i64>,
    /// Exclusive lower bound in Unix milliseconds; 0 = unbounded
    #[serde(default)]
    pub since: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetMessagesResult {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartListeningOptions {
    #[serde(default)]
    pub senders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartListeningResult {
    pub listening: bool,
    pub senders: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopListeningResult {
    pub listening: bool,
}

pub struct SmsReader {
    gate: PermissionGate,
    store: Arc<dyn MessageStore>,
    listener: LiveListener,
    events: EventHub,
    default_limit: u32,
}

impl SmsReader {
    pub fn new(
        permissions: Arc<dyn PermissionProvider>,
        store: Arc<dyn MessageStore>,
        broadcast: Arc<dyn MessageBroadcast>,
    ) -> Self {
        let events = EventHub::new();
        Self {
            gate: PermissionGate::new(permissions),
            store,
            listener: LiveListener::new(broadcast, events.clone()),
            events,
            default_limit: DEFAULT_LIMIT,
        }
    }

    /// Reader over the configured inbox: file access as the grant, the inbox
    /// as the store, and a poller on the inbox for live delivery.
    pub fn from_config(config: &Config) -> Self {
        let db_path = config.db_path();
        Self::new(
            Arc::new(InboxAccess::new(&db_path)),
            Arc::new(SqliteStore::new(&db_path)),
            Arc::new(StorePoller::new(&db_path, config.poll_interval())),
        )
        .with_default_limit(config.default_limit)
    }

    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    pub fn check_permissions(&self) -> PermissionStatus {
        PermissionStatus {
            sms: self.gate.check_state(),
        }
    }

    pub async fn request_permissions(&self) -> PermissionStatus {
        PermissionStatus {
            sms: self.gate.request_state().await,
        }
    }

    /// Stored messages from the given senders, newest first.
    pub fn get_messages(&self, options: &GetMessagesOptions) -> Result<GetMessagesResult> {
        self.gate.ensure_granted()?;

        let senders: SenderSet = options.senders.iter().collect();
        let limit = options.limit.unwrap_or(self.default_limit as i64);
        let query = Query::new(senders, options.since, limit)?;
        let built = query::build(&query);

        let messages = self.store.query(&built).map_err(|e| {
            tracing::debug!(error = %e, "store query failed");
            e
        })?;
        tracing::debug!(
            senders = query.senders().len(),
            since = query.since_millis(),
            limit = query.limit(),
            returned = messages.len(),
            "messages retrieved"
        );
        Ok(GetMessagesResult { messages })
    }

    pub fn start_listening(&self, options: &StartListeningOptions) -> Result<StartListeningResult> {
        self.gate.ensure_granted()?;

        let senders: SenderSet = options.senders.iter().collect();
        let status = self.listener.start(senders)?;
        Ok(StartListeningResult {
            listening: status.listening,
            senders: options.senders.clone(),
        })
    }

    /// Never fails and needs no grant: stopping only releases resources.
    pub fn stop_listening(&self) -> StopListeningResult {
        let status = self.listener.stop();
        StopListeningResult {
            listening: status.listening,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_active()
    }

    /// Register a `messageReceived` callback.
    pub fn add_listener<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.events.add_listener(callback)
    }

    pub fn remove_all_listeners(&self) {
        self.events.remove_all_listeners();
    }

    /// `messageReceived` events for async hosts.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.events.subscribe()
    }

    /// Host teardown; also runs when the reader is dropped.
    pub fn shutdown(&self) {
        self.listener.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{ChannelBroadcast, RawMessage};
    use crate::db::store::MemoryStore;
    use crate::error::SmsError;
    use crate::permission::StaticPermissions;
    use parking_lot::Mutex;

    struct Fixture {
        permissions: Arc<StaticPermissions>,
        store: Arc<MemoryStore>,
        broadcast: Arc<ChannelBroadcast>,
        reader: SmsReader,
    }

    fn fixture(state: PermissionState) -> Fixture {
        let permissions = Arc::new(StaticPermissions::new(state));
        let store = Arc::new(MemoryStore::new());
        let broadcast = Arc::new(ChannelBroadcast::new());
        let reader = SmsReader::new(permissions.clone(), store.clone(), broadcast.clone());
        Fixture {
            permissions,
            store,
            broadcast,
            reader,
        }
    }

    fn stored(id: &str, address: &str, ts: i64) -> Message {
        Message {
            id: id.to_string(),
            address: Some(address.to_string()),
            body: Some(format!("body {}", id)),
            timestamp_millis: ts,
            read: true,
        }
    }

    fn opts(senders: &[&str], limit: Option<i64>, since: i64) -> GetMessagesOptions {
        GetMessagesOptions {
            senders: senders.iter().map(|s| s.to_string()).collect(),
            limit,
            since,
        }
    }

    #[test]
    fn test_get_messages_newest_first_limited() {
        let f = fixture(PermissionState::Granted);
        f.store.insert(stored("1", "BANK", 100));
        f.store.insert(stored("2", "BANK", 300));
        f.store.insert(stored("3", "BANK", 200));
        f.store.insert(stored("4", "FRIEND", 400));

        let result = f.reader.get_messages(&opts(&["BANK"], Some(2), 0)).unwrap();
        let dates: Vec<i64> = result.messages.iter().map(|m| m.timestamp_millis).collect();
        assert_eq!(dates, vec![300, 200]);
    }

    #[test]
    fn test_get_messages_since_bound() {
        let f = fixture(PermissionState::Granted);
        f.store.insert(stored("1", "KCB", 100));
        f.store.insert(stored("2", "KCB", 200));

        let result = f.reader.get_messages(&opts(&["kcb"], None, 100)).unwrap();
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].id, "2");
    }

    #[test]
    fn test_get_messages_requires_permission() {
        let f = fixture(PermissionState::Denied);
        f.store.set_failure(Some("must not be queried".to_string()));
        let err = f.reader.get_messages(&opts(&["BANK"], None, 0)).unwrap_err();
        assert!(matches!(err, SmsError::PermissionDenied));
    }

    #[test]
    fn test_get_messages_no_senders() {
        let f = fixture(PermissionState::Granted);
        let err = f.reader.get_messages(&opts(&[], None, 0)).unwrap_err();
        assert_eq!(err.to_string(), "No senders specified");
    }

    #[test]
    fn test_blank_sender_is_a_pattern() {
        let f = fixture(PermissionState::Granted);
        f.store.insert(stored("1", "MY BANK", 100));
        f.store.insert(stored("2", "MYBANK", 200));

        let result = f.reader.get_messages(&opts(&[" "], None, 0)).unwrap();
        let ids: Vec<&str> = result.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);

        let started = f
            .reader
            .start_listening(&StartListeningOptions {
                senders: vec![String::new()],
            })
            .unwrap();
        assert!(started.listening);
        assert_eq!(f.broadcast.subscriber_count(), 1);
    }

    #[test]
    fn test_get_messages_store_failure_propagates() {
        let f = fixture(PermissionState::Granted);
        f.store.set_failure(Some("cursor closed".to_string()));
        let err = f.reader.get_messages(&opts(&["BANK"], None, 0)).unwrap_err();
        assert!(matches!(err, SmsError::Store(_)));
    }

    #[test]
    fn test_start_listening_denied_mutates_nothing() {
        let f = fixture(PermissionState::Prompting);
        let err = f
            .reader
            .start_listening(&StartListeningOptions {
                senders: vec!["BANK".to_string()],
            })
            .unwrap_err();
        assert!(matches!(err, SmsError::PermissionDenied));
        assert!(!f.reader.is_listening());
        assert_eq!(f.broadcast.subscriber_count(), 0);
    }

    #[test]
    fn test_listen_roundtrip() {
        let f = fixture(PermissionState::Granted);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = f.reader.add_listener(move |m| sink.lock().push(m.clone()));

        let result = f
            .reader
            .start_listening(&StartListeningOptions {
                senders: vec!["Bank".to_string()],
            })
            .unwrap();
        assert_eq!(
            result,
            StartListeningResult {
                listening: true,
                senders: vec!["Bank".to_string()],
            }
        );

        f.broadcast.dispatch(&[
            RawMessage {
                sender: Some("MYBANK-PROMO".to_string()),
                body: Some("50% off".to_string()),
                timestamp_millis: 1_000,
            },
            RawMessage {
                sender: Some("FRIEND".to_string()),
                body: Some("hi".to_string()),
                timestamp_millis: 1_001,
            },
        ]);
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(seen.lock()[0].id, "1000");

        handle.remove();
        assert_eq!(f.reader.stop_listening(), StopListeningResult { listening: false });
        assert_eq!(f.reader.stop_listening(), StopListeningResult { listening: false });
        assert_eq!(f.broadcast.subscriber_count(), 0);
    }

    #[test]
    fn test_stop_listening_without_permission() {
        let f = fixture(PermissionState::Granted);
        f.reader
            .start_listening(&StartListeningOptions {
                senders: vec!["BANK".to_string()],
            })
            .unwrap();

        f.permissions.set(PermissionState::Denied);
        assert!(!f.reader.stop_listening().listening);
        assert_eq!(f.broadcast.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_request_permissions() {
        let permissions = Arc::new(
            StaticPermissions::new(PermissionState::Prompting)
                .with_prompt_outcome(PermissionState::Granted),
        );
        let reader = SmsReader::new(
            permissions,
            Arc::new(MemoryStore::new()),
            Arc::new(ChannelBroadcast::new()),
        );

        assert_eq!(reader.check_permissions().sms, PermissionState::Prompting);
        assert_eq!(reader.request_permissions().await.sms, PermissionState::Granted);
    }

    #[test]
    fn test_options_from_json_defaults() {
        let options: GetMessagesOptions = serde_json::from_str(r#"{"senders": ["MPESA"]}"#).unwrap();
        assert_eq!(options.limit, None);
        assert_eq!(options.since, 0);

        let f = fixture(PermissionState::Granted);
        for i in 0..150 {
            f.store.insert(stored(&i.to_string(), "MPESA", i));
        }
        assert_eq!(f.reader.get_messages(&options).unwrap().messages.len(), 100);
    }
}
