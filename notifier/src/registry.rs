use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace};

/// Identifies one observer connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Named message delivered to the observer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    pub data: serde_json::Value,
}

impl Envelope {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

struct Observer {
    id: ObserverId,
    tx: mpsc::UnboundedSender<Envelope>,
}

/// Single-slot observer registry.
///
/// Cloning shares the slot. Publishing never blocks: delivery goes through
/// an unbounded channel drained by whoever holds the receiver.
#[derive(Clone, Default)]
pub struct Notifier {
    slot: Arc<Mutex<Option<Observer>>>,
    next_id: Arc<AtomicU64>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new observer, replacing any current one.
    pub fn connect(&self) -> (ObserverId, mpsc::UnboundedReceiver<Envelope>) {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();

        let replaced = self.slot.lock().replace(Observer { id, tx });
        match replaced {
            Some(old) => info!(observer = %id, replaced = %old.id, "observer connected"),
            None => info!(observer = %id, "observer connected"),
        }

        (id, rx)
    }

    /// Clears the slot if `id` is still the current observer.
    ///
    /// Returns false when a newer observer has taken over.
    pub fn disconnect(&self, id: ObserverId) -> bool {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|o| o.id == id) {
            *slot = None;
            info!(observer = %id, "observer disconnected");
            true
        } else {
            debug!(observer = %id, "stale observer disconnect ignored");
            false
        }
    }

    pub fn is_connected(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub fn current(&self) -> Option<ObserverId> {
        self.slot.lock().as_ref().map(|o| o.id)
    }

    /// Sends a named message to the current observer.
    ///
    /// Returns whether it was handed to an observer. An empty slot or an
    /// unserializable payload is logged and dropped.
    pub fn publish<T: Serialize + ?Sized>(&self, event: &str, data: &T) -> bool {
        let mut slot = self.slot.lock();
        let Some(observer) = slot.as_ref() else {
            trace!(event, "no observer connected; message dropped");
            return false;
        };

        let data = match serde_json::to_value(data) {
            Ok(v) => v,
            Err(e) => {
                error!(event, error = %e, "failed to serialize notification payload");
                return false;
            }
        };

        let envelope = Envelope {
            event: event.to_string(),
            data,
        };

        if observer.tx.send(envelope).is_err() {
            // Receiver gone without an explicit disconnect.
            debug!(observer = %observer.id, "observer channel closed; clearing slot");
            *slot = None;
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn publish_without_observer_is_noop() {
        let n = Notifier::new();
        assert!(!n.publish("status", &json!({"a": 1})));
        assert!(!n.is_connected());
    }

    #[test]
    fn observer_receives_named_messages() {
        let n = Notifier::new();
        let (_id, mut rx) = n.connect();

        assert!(n.publish("status", &json!({"bearish": true})));

        let env = rx.try_recv().expect("message queued");
        assert_eq!(env.event, "status");
        assert_eq!(env.data, json!({"bearish": true}));
    }

    #[test]
    fn newest_connection_replaces_previous() {
        let n = Notifier::new();
        let (first, mut rx1) = n.connect();
        let (second, mut rx2) = n.connect();

        n.publish("status", &json!(1));

        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().expect("delivered").data, json!(1));

        // The replaced connection closing must not evict the live one.
        assert!(!n.disconnect(first));
        assert_eq!(n.current(), Some(second));

        assert!(n.disconnect(second));
        assert!(!n.is_connected());
    }

    #[test]
    fn dropped_receiver_clears_slot() {
        let n = Notifier::new();
        let (_id, rx) = n.connect();
        drop(rx);

        assert!(!n.publish("status", &json!(null)));
        assert!(!n.is_connected());
    }

    #[test]
    fn envelope_wire_shape() {
        let env = Envelope {
            event: "buy:cancelled".into(),
            data: json!({"id": 7}),
        };
        let v: serde_json::Value =
            serde_json::from_str(&env.to_json().expect("serialize")).expect("parse");
        assert_eq!(v, json!({"event": "buy:cancelled", "data": {"id": 7}}));
    }
}
