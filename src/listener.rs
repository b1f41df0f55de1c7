//! Live listener: Inactive/Active state machine over a broadcast subscription.
//!
//! The listener state (active flag + filter) is the only state shared between
//! host calls and delivery callbacks. It sits behind one mutex; deliveries take
//! a snapshot of the filter per batch and never hold the lock while matching,
//! emitting or calling the collaborator.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};

use crate::broadcast::{DeliveryHandler, MessageBroadcast, Priority, RawMessage, SubscriptionId};
use crate::error::{Result, SmsError};
use crate::events::EventHub;
use crate::filter::{self, SenderSet};
use crate::message::Message;

/// Result of a start/stop transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerStatus {
    pub listening: bool,
    pub senders: SenderSet,
}

#[derive(Default)]
struct ListenerState {
    active: bool,
    filter: Arc<SenderSet>,
    /// Bumped on every registration; stale handlers compare against it.
    generation: u64,
    registration: Option<SubscriptionId>,
    /// Last handle ever registered, kept past `stop` for teardown.
    last_registration: Option<SubscriptionId>,
}

struct Shared {
    state: Mutex<ListenerState>,
    events: EventHub,
}

pub struct LiveListener {
    shared: Arc<Shared>,
    broadcast: Arc<dyn MessageBroadcast>,
}

impl LiveListener {
    pub fn new(broadcast: Arc<dyn MessageBroadcast>, events: EventHub) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ListenerState::default()),
                events,
            }),
            broadcast,
        }
    }

    pub fn is_active(&self) -> bool {
        self.shared.state.lock().active
    }

    /// Current filter (empty while inactive).
    pub fn filter(&self) -> SenderSet {
        SenderSet::clone(&self.shared.state.lock().filter)
    }

    /// Install `senders` as the filter and make sure a subscription exists.
    ///
    /// Repeated calls replace the filter without registering again.
    pub fn start(&self, senders: SenderSet) -> Result<ListenerStatus> {
        if senders.is_empty() {
            return Err(SmsError::no_senders());
        }

        let mut state = self.shared.state.lock();
        state.filter = Arc::new(senders.clone());

        if state.active {
            tracing::info!(senders = senders.len(), "listener filter replaced");
            return Ok(ListenerStatus {
                listening: true,
                senders,
            });
        }

        state.generation += 1;
        let handler = delivery_handler(Arc::downgrade(&self.shared), state.generation);

        match self.broadcast.subscribe(Priority::SYSTEM_HIGH, handler) {
            Ok(id) => {
                state.active = true;
                state.registration = Some(id);
                state.last_registration = Some(id);
                tracing::info!(%id, senders = senders.len(), "listener started");
                Ok(ListenerStatus {
                    listening: true,
                    senders,
                })
            }
            Err(e) => {
                state.filter = Arc::default();
                tracing::warn!(error = %e, "listener registration failed");
                Err(SmsError::Subscribe(e.to_string()))
            }
        }
    }

    /// Drop the subscription and clear the filter. Never fails.
    pub fn stop(&self) -> ListenerStatus {
        let registration = {
            let mut state = self.shared.state.lock();
            let registration = if state.active {
                state.registration.take()
            } else {
                None
            };
            state.active = false;
            state.filter = Arc::default();
            registration
        };

        if let Some(id) = registration {
            self.unregister(id);
            tracing::info!(%id, "listener stopped");
        }

        ListenerStatus {
            listening: false,
            senders: SenderSet::new(),
        }
    }

    /// Host shutdown: unregister whatever was last registered, regardless of
    /// the recorded flag.
    pub fn shutdown(&self) {
        let registration = {
            let mut state = self.shared.state.lock();
            state.active = false;
            state.filter = Arc::default();
            state.registration = None;
            state.last_registration.take()
        };

        if let Some(id) = registration {
            self.unregister(id);
        }
    }

    fn unregister(&self, id: SubscriptionId) {
        // The collaborator may have dropped the subscription already.
        if let Err(e) = self.broadcast.unsubscribe(id) {
            tracing::debug!(%id, error = %e, "unregister failed (ignored)");
        }
    }
}

impl Drop for LiveListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn delivery_handler(shared: Weak<Shared>, generation: u64) -> DeliveryHandler {
    Arc::new(move |batch: &[RawMessage]| {
        if let Some(shared) = shared.upgrade() {
            deliver(&shared, generation, batch);
        }
    })
}

fn deliver(shared: &Shared, generation: u64, batch: &[RawMessage]) {
    let filter = {
        let state = shared.state.lock();
        if !state.active || state.generation != generation {
            return;
        }
        Arc::clone(&state.filter)
    };

    let mut emitted = 0usize;
    for raw in batch {
        if filter::matches(raw.sender.as_deref(), &filter) {
            shared.events.emit(Message::live(
                raw.sender.clone(),
                raw.body.clone(),
                raw.timestamp_millis,
            ));
            emitted += 1;
        }
    }
    tracing::debug!(batch = batch.len(), emitted, "delivery filtered");
}
