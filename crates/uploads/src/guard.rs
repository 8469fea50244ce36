//! Single-slot guard around in-flight uploads.

use crate::error::UploadError;
use crate::execution::{BackgroundExecution, GrantId};
use lifeline_events::{
    now_ms, publish_to, topics, EventBusRef, NullEventBus, UploadLifecycleEvent, UploadStage,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Name the grant is requested under.
pub const GRANT_NAME: &str = "post-upload";

/// Opaque identifier of an upload ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Proof that the caller holds the upload slot. Hand it back to
/// [`UploadGuard::end_upload`] when the upload completes or fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    id: TicketId,
}

impl UploadTicket {
    pub fn id(&self) -> TicketId {
        self.id
    }
}

/// Observable state of the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GuardStatus {
    Idle,
    InProgress {
        ticket: TicketId,
        /// `None` when the platform refused extended execution.
        grant: Option<GrantId>,
        started_at_ms: i64,
    },
}

impl GuardStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, GuardStatus::InProgress { .. })
    }
}

#[derive(Debug)]
struct ActiveUpload {
    ticket: TicketId,
    grant: Option<GrantId>,
    started_at_ms: i64,
}

/// Wraps uploads in an extended-execution grant so they can finish after the
/// app leaves the foreground.
///
/// There is exactly one slot: the platform model has a single background
/// task identifier, and concurrent uploads share it. State machine:
/// `Idle -> InProgress` on [`begin_upload`](Self::begin_upload),
/// `InProgress -> Idle` on [`end_upload`](Self::end_upload) or
/// [`on_expiration_warning`](Self::on_expiration_warning).
pub struct UploadGuard {
    slot: Mutex<Option<ActiveUpload>>,
    execution: Arc<dyn BackgroundExecution>,
    events: EventBusRef,
}

impl UploadGuard {
    pub fn new(execution: Arc<dyn BackgroundExecution>) -> Self {
        Self::with_event_bus(execution, Arc::new(NullEventBus))
    }

    pub fn with_event_bus(execution: Arc<dyn BackgroundExecution>, events: EventBusRef) -> Self {
        Self {
            slot: Mutex::new(None),
            execution,
            events,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ActiveUpload>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, ticket: TicketId, stage: UploadStage) {
        publish_to(
            self.events.as_ref(),
            topics::UPLOAD_LIFECYCLE,
            &UploadLifecycleEvent {
                ticket: ticket.to_string(),
                stage,
                timestamp_ms: now_ms(),
            },
        );
    }

    /// Claim the slot and request extended execution.
    ///
    /// # Errors
    ///
    /// [`UploadError::AlreadyInProgress`] if a ticket is already live.
    pub fn begin_upload(&self) -> Result<UploadTicket, UploadError> {
        let ticket = {
            let mut slot = self.slot();
            if let Some(active) = slot.as_ref() {
                tracing::warn!(active = %active.ticket, "upload already in progress");
                return Err(UploadError::AlreadyInProgress {
                    active: active.ticket,
                });
            }

            let ticket = TicketId(Uuid::new_v4());
            let grant = self.execution.begin(GRANT_NAME);
            if grant.is_none() {
                tracing::warn!(%ticket, "extended execution refused, upload may be suspended");
            }
            *slot = Some(ActiveUpload {
                ticket,
                grant,
                started_at_ms: now_ms(),
            });
            tracing::info!(%ticket, grant = ?grant, "upload started");
            ticket
        };

        self.emit(ticket, UploadStage::Started);
        Ok(UploadTicket { id: ticket })
    }

    /// Release the slot held by `ticket`.
    ///
    /// Stale tickets (already ended, or expired by the OS) are ignored.
    /// Returns whether anything was released.
    pub fn end_upload(&self, ticket: &UploadTicket) -> bool {
        let released = {
            let mut slot = self.slot();
            match slot.as_ref() {
                Some(active) if active.ticket == ticket.id => slot.take(),
                _ => None,
            }
        };

        let Some(active) = released else {
            tracing::debug!(ticket = %ticket.id, "end_upload with stale ticket, ignoring");
            return false;
        };

        if let Some(grant) = active.grant {
            self.execution.end(grant);
        }
        tracing::info!(ticket = %active.ticket, "upload finished");
        self.emit(active.ticket, UploadStage::Finished);
        true
    }

    /// The platform is about to expire the grant.
    ///
    /// Runs synchronously and releases the grant before returning; holding an
    /// expired grant gets the process killed. Returns the ticket that was
    /// force-ended, if any.
    pub fn on_expiration_warning(&self) -> Option<TicketId> {
        let active = self.slot().take()?;
        if let Some(grant) = active.grant {
            self.execution.end(grant);
        }
        tracing::warn!(ticket = %active.ticket, "extended execution expiring, upload force-ended");
        self.emit(active.ticket, UploadStage::Expired);
        Some(active.ticket)
    }

    /// Make sure the live upload holds a grant, requesting one if the
    /// platform refused earlier. Called when the app is backgrounded.
    /// Returns whether a grant is held afterwards.
    pub fn ensure_grant(&self) -> bool {
        let mut slot = self.slot();
        let Some(active) = slot.as_mut() else {
            return false;
        };
        if active.grant.is_none() {
            active.grant = self.execution.begin(GRANT_NAME);
            tracing::debug!(ticket = %active.ticket, grant = ?active.grant, "re-requested extended execution");
        }
        active.grant.is_some()
    }

    pub fn status(&self) -> GuardStatus {
        match self.slot().as_ref() {
            None => GuardStatus::Idle,
            Some(active) => GuardStatus::InProgress {
                ticket: active.ticket,
                grant: active.grant,
                started_at_ms: active.started_at_ms,
            },
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.slot().is_some()
    }
}

impl std::fmt::Debug for UploadGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadGuard")
            .field("status", &self.status())
            .field("execution", &"BackgroundExecution")
            .finish()
    }
}
