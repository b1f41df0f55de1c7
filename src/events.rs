//! Fan-out of `messageReceived` events to host listeners.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;

use crate::message::Message;

/// Event name used on the wire.
pub const MESSAGE_RECEIVED: &str = "messageReceived";

/// Buffered events per async subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 256;

pub type Callback = Arc<dyn Fn(&Message) + Send + Sync>;

struct Inner {
    callbacks: Mutex<Vec<(u64, Callback)>>,
    next_id: AtomicU64,
    sender: broadcast::Sender<Message>,
}

/// Registry of event listeners. Cloning shares the registry.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<Inner>,
}

/// Returned by `add_listener`; detaches that one callback.
pub struct ListenerHandle {
    id: u64,
    hub: Weak<Inner>,
}

impl ListenerHandle {
    pub fn remove(self) {
        if let Some(inner) = self.hub.upgrade() {
            inner.callbacks.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                callbacks: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                sender,
            }),
        }
    }

    pub fn add_listener<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.callbacks.lock().push((id, Arc::new(callback)));
        ListenerHandle {
            id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Detach every callback. Async subscribers are unaffected.
    pub fn remove_all_listeners(&self) {
        self.inner.callbacks.lock().clear();
    }

    /// Receive events asynchronously.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.inner.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.callbacks.lock().len()
    }

    /// Deliver one event to every callback and async subscriber.
    ///
    /// Callbacks run outside the registry lock and may add or remove listeners.
    pub fn emit(&self, message: Message) {
        let callbacks: Vec<Callback> = self
            .inner
            .callbacks
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in &callbacks {
            callback(&message);
        }

        // No async subscribers is fine.
        let _ = self.inner.sender.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(ts: i64) -> Message {
        Message::live(Some("KCB".into()), Some("credited".into()), ts)
    }

    #[test]
    fn test_callbacks_receive_events() {
        let hub = EventHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _handle = hub.add_listener(move |m| sink.lock().push(m.timestamp_millis));

        hub.emit(msg(1));
        hub.emit(msg(2));
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn test_handle_remove_detaches_one() {
        let hub = EventHub::new();
        let first = hub.add_listener(|_| {});
        let _second = hub.add_listener(|_| {});
        assert_eq!(hub.listener_count(), 2);

        first.remove();
        assert_eq!(hub.listener_count(), 1);

        hub.remove_all_listeners();
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_emit_without_listeners() {
        let hub = EventHub::new();
        hub.emit(msg(1));
    }

    #[tokio::test]
    async fn test_async_subscriber() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();
        hub.emit(msg(7));
        assert_eq!(rx.recv().await.unwrap().id, "7");
    }
}
