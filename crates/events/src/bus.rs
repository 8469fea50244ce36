//! Event bus abstraction for decoupled event emission.
//!
//! The coordinator and the upload guard publish observable transitions
//! through this trait so that a UI shell, a log sink or a test can subscribe
//! without the core depending on any of them.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Sink for topic-addressed JSON events.
pub trait EventBus: Send + Sync {
    /// Emit an event with a JSON payload.
    ///
    /// # Arguments
    /// * `topic` - Event name (see [`crate::topics`])
    /// * `payload` - JSON payload to emit
    fn emit(&self, topic: &str, payload: serde_json::Value);

    /// Serialize `event` and emit it.
    ///
    /// Serialization failures are logged and the event is dropped; emitting
    /// is never allowed to fail the caller's state transition.
    fn publish<T: Serialize>(&self, topic: &str, event: &T)
    where
        Self: Sized,
    {
        publish_to(self, topic, event);
    }
}

/// Type alias for shared event bus reference.
pub type EventBusRef = Arc<dyn EventBus>;

/// Serialize and emit on a possibly unsized bus (e.g. `dyn EventBus`).
pub fn publish_to<B, T>(bus: &B, topic: &str, event: &T)
where
    B: EventBus + ?Sized,
    T: Serialize,
{
    match serde_json::to_value(event) {
        Ok(payload) => bus.emit(topic, payload),
        Err(e) => tracing::warn!(topic, error = %e, "dropping unserializable event"),
    }
}

/// A captured event from [`InMemoryEventBus`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Event bus that records everything it receives.
///
/// Used by tests to assert on what was published.
#[derive(Default)]
pub struct InMemoryEventBus {
    events: Mutex<Vec<EmittedEvent>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<EmittedEvent>> {
        // A panicking subscriber must not take the recorder down with it.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of every captured event, in emission order.
    pub fn events(&self) -> Vec<EmittedEvent> {
        self.guard().clone()
    }

    /// Captured events for a single topic, in emission order.
    pub fn events_for(&self, topic: &str) -> Vec<EmittedEvent> {
        self.guard()
            .iter()
            .filter(|e| e.topic == topic)
            .cloned()
            .collect()
    }

    /// Payload of the most recent event on `topic`.
    pub fn last_payload(&self, topic: &str) -> Option<serde_json::Value> {
        self.guard()
            .iter()
            .rev()
            .find(|e| e.topic == topic)
            .map(|e| e.payload.clone())
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}

impl EventBus for InMemoryEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        self.guard().push(EmittedEvent {
            topic: topic.to_string(),
            payload,
        });
    }
}

/// Event bus that forwards every event to `tracing` at debug level.
pub struct TracingEventBus;

impl EventBus for TracingEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        tracing::debug!(topic, %payload, "event");
    }
}

/// No-op event bus that discards all events.
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn emit(&self, _topic: &str, _payload: serde_json::Value) {}
}
