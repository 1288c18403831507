//! Edge Pub/Sub Bus
//!
//! In-process observer fan-out for edge events. Synchronous delivery in
//! registration order, at-most-once: no buffering, no replay - a consumer
//! not subscribed at publish time misses the event.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::logic::uplink::{EdgeEvent, EventKind};

// ============================================================================
// TYPES
// ============================================================================

/// Subscriber callback. Invoked synchronously on the publishing tick.
pub type Subscriber = Arc<dyn Fn(&EdgeEvent) + Send + Sync>;

/// Token returned on subscribe, used for symmetric unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

// ============================================================================
// EVENT BUS
// ============================================================================

/// Constructed bus instance - no module-level globals, so tests can run
/// independent buses side by side.
pub struct EventBus {
    next_id: AtomicU64,
    subscribers: RwLock<HashMap<EventKind, Vec<(u64, Subscriber)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a callback for one event kind
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&EdgeEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .write()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        SubscriptionId(id)
    }

    /// Remove a subscription. Unknown tokens are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut map = self.subscribers.write();
        for list in map.values_mut() {
            list.retain(|(sid, _)| *sid != id.0);
        }
    }

    /// Invoke all currently-registered callbacks for the event's kind,
    /// synchronously, in registration order.
    pub fn publish(&self, event: &EdgeEvent) {
        // Snapshot outside the lock so a callback may re-enter the bus.
        let callbacks: Vec<Subscriber> = {
            let map = self.subscribers.read();
            map.get(&event.kind())
                .map(|list| list.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback(event);
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers
            .read()
            .get(&kind)
            .map(|l| l.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parking_lot::Mutex;

    fn log_event(line: &str) -> EdgeEvent {
        EdgeEvent::Log {
            machine_id: "CNC-MILL-01".to_string(),
            timestamp: Utc::now(),
            line: line.to_string(),
        }
    }

    #[test]
    fn test_delivery_preserves_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe(EventKind::Log, move |_| order.lock().push(tag));
        }

        bus.publish(&log_event("x"));
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_publish() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(0u32));

        bus.publish(&log_event("before anyone listens"));

        let seen_cb = Arc::clone(&seen);
        bus.subscribe(EventKind::Log, move |_| *seen_cb.lock() += 1);

        bus.publish(&log_event("after subscribe"));
        assert_eq!(*seen.lock(), 1, "no replay of events published earlier");
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(0u32));

        let seen_cb = Arc::clone(&seen);
        let token = bus.subscribe(EventKind::Log, move |_| *seen_cb.lock() += 1);

        bus.publish(&log_event("one"));
        bus.unsubscribe(token);
        bus.publish(&log_event("two"));

        assert_eq!(*seen.lock(), 1);
        assert_eq!(bus.subscriber_count(EventKind::Log), 0);
    }

    #[test]
    fn test_kinds_are_isolated() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(0u32));

        let seen_cb = Arc::clone(&seen);
        bus.subscribe(EventKind::Alert, move |_| *seen_cb.lock() += 1);

        bus.publish(&log_event("a log line"));
        assert_eq!(*seen.lock(), 0);
    }
}
