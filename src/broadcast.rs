//! Delivery of newly arrived messages.
//!
//! A `MessageBroadcast` accepts a delivery handler at a priority and calls it
//! with batches of raw incoming messages until unsubscribed.
//!
//! Two implementations:
//! - `ChannelBroadcast`: in-process dispatcher; the host pushes batches.
//! - `StorePoller`: watches the inbox database for newly inserted rows.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{connection, store};

/// A message as handed over by the delivery mechanism, before filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub sender: Option<String>,
    pub body: Option<String>,
    /// Unix milliseconds
    #[serde(rename = "date")]
    pub timestamp_millis: i64,
}

/// Delivery priority. Higher values see a batch first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    pub const DEFAULT: Priority = Priority(0);
    /// Ahead of default system handling.
    pub const SYSTEM_HIGH: Priority = Priority(999);
}

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Callback invoked once per delivered batch.
pub type DeliveryHandler = Arc<dyn Fn(&[RawMessage]) + Send + Sync>;

#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("Subscription not registered: {0}")]
    NotRegistered(SubscriptionId),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),
}

/// External delivery mechanism for incoming messages.
pub trait MessageBroadcast: Send + Sync {
    fn subscribe(
        &self,
        priority: Priority,
        handler: DeliveryHandler,
    ) -> Result<SubscriptionId, BroadcastError>;

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BroadcastError>;
}

// ============================================================================
// In-process dispatcher
// ============================================================================

struct Registration {
    id: SubscriptionId,
    priority: Priority,
    handler: DeliveryHandler,
}

/// Dispatcher the host feeds directly.
#[derive(Default)]
pub struct ChannelBroadcast {
    registrations: RwLock<Vec<Registration>>,
}

impl ChannelBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one batch to every subscriber, highest priority first.
    ///
    /// Handlers run on the caller's thread, outside the registration lock, so
    /// a handler may unsubscribe itself. Returns how many handlers ran.
    pub fn dispatch(&self, batch: &[RawMessage]) -> usize {
        let handlers: Vec<DeliveryHandler> = self
            .registrations
            .read()
            .iter()
            .map(|r| Arc::clone(&r.handler))
            .collect();

        for handler in &handlers {
            handler(batch);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registrations.read().len()
    }
}

impl MessageBroadcast for ChannelBroadcast {
    fn subscribe(
        &self,
        priority: Priority,
        handler: DeliveryHandler,
    ) -> Result<SubscriptionId, BroadcastError> {
        let id = SubscriptionId::new();
        let mut registrations = self.registrations.write();
        // Stable: equal priorities keep registration order.
        let pos = registrations
            .iter()
            .position(|r| r.priority < priority)
            .unwrap_or(registrations.len());
        registrations.insert(
            pos,
            Registration {
                id,
                priority,
                handler,
            },
        );
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BroadcastError> {
        let mut registrations = self.registrations.write();
        match registrations.iter().position(|r| r.id == id) {
            Some(pos) => {
                registrations.remove(pos);
                Ok(())
            }
            None => Err(BroadcastError::NotRegistered(id)),
        }
    }
}

// ============================================================================
// Inbox poller
// ============================================================================

struct Worker {
    /// Wakes the poller out of its interval wait; dropping it also stops the thread.
    wake: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Watches the inbox database and delivers rows inserted after subscription.
///
/// Each subscription owns one polling thread and its own read-only connection.
/// Priority has no effect here: each subscriber has its own cursor.
pub struct StorePoller {
    db_path: PathBuf,
    interval: Duration,
    workers: Mutex<HashMap<SubscriptionId, Worker>>,
}

impl StorePoller {
    pub fn new(db_path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            db_path: db_path.into(),
            interval,
            workers: Mutex::new(HashMap::new()),
        }
    }
}

impl MessageBroadcast for StorePoller {
    fn subscribe(
        &self,
        priority: Priority,
        handler: DeliveryHandler,
    ) -> Result<SubscriptionId, BroadcastError> {
        let conn = connection::open_db(&self.db_path)
            .map_err(|e| BroadcastError::Subscribe(e.to_string()))?;
        let mut last_seen =
            store::query_max_row_id(&conn).map_err(|e| BroadcastError::Subscribe(e.to_string()))?;

        let id = SubscriptionId::new();
        let (wake, stop_rx) = mpsc::channel::<()>();
        let interval = self.interval;

        let handle = std::thread::Builder::new()
            .name(format!("sms-poller-{}", id))
            .spawn(move || {
                tracing::debug!(%id, ?priority, last_seen, "inbox poller started");
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let rows = match store::query_rows_after(&conn, last_seen) {
                        Ok(rows) => rows,
                        Err(e) => {
                            tracing::warn!(%id, error = %e, "inbox poll failed");
                            continue;
                        }
                    };
                    if rows.is_empty() {
                        continue;
                    }

                    let batch: Vec<RawMessage> = rows
                        .into_iter()
                        .map(|(row_id, msg)| {
                            last_seen = last_seen.max(row_id);
                            RawMessage {
                                sender: msg.address,
                                body: msg.body,
                                timestamp_millis: msg.timestamp_millis,
                            }
                        })
                        .collect();
                    handler(&batch);
                }
                tracing::debug!(%id, "inbox poller stopped");
            })
            .map_err(|e| BroadcastError::Subscribe(e.to_string()))?;

        self.workers.lock().insert(id, Worker { wake, handle });
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BroadcastError> {
        let worker = self
            .workers
            .lock()
            .remove(&id)
            .ok_or(BroadcastError::NotRegistered(id))?;

        let _ = worker.wake.send(());
        // Unsubscribing from inside the handler: the thread exits on its own.
        if worker.handle.thread().id() != std::thread::current().id() {
            let _ = worker.handle.join();
        }
        Ok(())
    }
}

impl Drop for StorePoller {
    fn drop(&mut self) {
        for (_, worker) in self.workers.lock().drain() {
            let _ = worker.wake.send(());
        }
    }
}
