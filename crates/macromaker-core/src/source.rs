//! Event sources
//!
//! The OS hook that produces raw events lives outside this crate. It only has
//! to implement [`EventSource`]; [`EventBus`] is the in-process implementation
//! used for imports, tests, and as the fan-out point behind a real hook.

use crate::input::RawEvent;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Receives events synchronously on the thread that delivers them.
///
/// Implementations must return quickly: the delivering thread is usually the
/// OS input hook.
pub trait InputListener: Send + Sync {
    fn on_event(&self, event: &RawEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub trait EventSource: Send + Sync {
    fn subscribe(&self, listener: Arc<dyn InputListener>) -> ListenerId;

    /// Unknown ids are ignored.
    fn unsubscribe(&self, id: ListenerId);

    /// Current time on the clock that stamps delivered events.
    fn now_ms(&self) -> u64;
}

/// Fan-out event source. Delivers in subscription order.
pub struct EventBus {
    listeners: RwLock<Vec<(ListenerId, Arc<dyn InputListener>)>>,
    next_id: AtomicU64,
    origin: Instant,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            origin: Instant::now(),
        }
    }

    /// Deliver one event to every current listener.
    pub fn dispatch(&self, event: &RawEvent) {
        // Snapshot so listeners may (un)subscribe while handling the event
        let listeners: Vec<Arc<dyn InputListener>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in listeners {
            listener.on_event(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for EventBus {
    fn subscribe(&self, listener: Arc<dyn InputListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        tracing::debug!(?id, "listener subscribed");
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.write().retain(|(lid, _)| *lid != id);
        tracing::debug!(?id, "listener unsubscribed");
    }

    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
