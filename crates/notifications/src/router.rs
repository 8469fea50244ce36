//! Notification router - dispatch now or hold until the UI is ready.

use crate::payload::{DeliveryContext, Destination};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// UI navigation collaborator.
pub trait Dispatcher: Send + Sync {
    /// Open `destination`. Only called once the UI is ready.
    fn dispatch(&self, destination: &Destination, context: DeliveryContext);
}

/// A payload waiting for the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingNotification {
    pub payload: Value,
    pub context: DeliveryContext,
    pub received_at_ms: i64,
}

/// What [`NotificationRouter::receive`] did with a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Dispatched right away.
    Consumed(Destination),
    /// Stored until the UI is ready.
    Deferred,
}

/// Routes push payloads to screens.
///
/// Holds at most one pending payload: a newer payload received before the
/// UI is ready replaces the older one.
pub struct NotificationRouter {
    dispatcher: Arc<dyn Dispatcher>,
    ui_ready: bool,
    pending: Option<PendingNotification>,
}

impl NotificationRouter {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            dispatcher,
            ui_ready: false,
            pending: None,
        }
    }

    pub fn is_ui_ready(&self) -> bool {
        self.ui_ready
    }

    pub fn pending(&self) -> Option<&PendingNotification> {
        self.pending.as_ref()
    }

    pub fn receive(&mut self, payload: Value, context: DeliveryContext) -> ReceiveOutcome {
        if self.ui_ready {
            let destination = Destination::from_payload(&payload);
            self.dispatcher.dispatch(&destination, context);
            tracing::info!(destination = destination.label(), context = context.label(), "notification dispatched");
            return ReceiveOutcome::Consumed(destination);
        }

        if let Some(previous) = self.pending.as_ref() {
            tracing::debug!(
                previous_context = previous.context.label(),
                "replacing pending notification"
            );
        }
        self.pending = Some(PendingNotification {
            payload,
            context,
            received_at_ms: chrono::Utc::now().timestamp_millis(),
        });
        tracing::info!(context = context.label(), "notification deferred until UI is ready");
        ReceiveOutcome::Deferred
    }

    /// Dispatch the pending payload, if any. No-op before the UI is ready.
    pub fn flush_pending(&mut self) -> Option<(Destination, DeliveryContext)> {
        if !self.ui_ready {
            return None;
        }
        let pending = self.pending.take()?;
        let destination = Destination::from_payload(&pending.payload);
        self.dispatcher.dispatch(&destination, pending.context);
        tracing::info!(
            destination = destination.label(),
            context = pending.context.label(),
            "deferred notification dispatched"
        );
        Some((destination, pending.context))
    }

    /// The UI finished initializing. Flushes the pending payload.
    pub fn mark_ui_ready(&mut self) -> Option<(Destination, DeliveryContext)> {
        self.ui_ready = true;
        self.flush_pending()
    }

    /// The UI was torn down; payloads are deferred again until the next
    /// [`mark_ui_ready`](Self::mark_ui_ready).
    pub fn reset_ui(&mut self) {
        self.ui_ready = false;
    }

    /// Drop the pending payload without dispatching it.
    pub fn discard_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
