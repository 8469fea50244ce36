//! Cloneable handle for posting events and reading the published snapshot.

use crate::alerts::Alert;
use crate::blog::BlogRef;
use crate::error::CoordinatorError;
use crate::event::CoordinatorEvent;
use crate::snapshot::AppSnapshot;
use lifeline_notifications::{DeliveryContext, DeviceToken};
use lifeline_uploads::{GuardStatus, TicketId, UploadGuard, UploadTicket};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// What the platform adapter, the UI and the upload subsystem hold on to.
///
/// Events are queued and handled in order by the coordinator. The upload
/// guard is the exception: it is called directly, because the expiration
/// warning must complete before the platform callback returns.
#[derive(Clone)]
pub struct CoordinatorHandle {
    events: mpsc::UnboundedSender<CoordinatorEvent>,
    snapshot: watch::Receiver<AppSnapshot>,
    uploads: Arc<UploadGuard>,
}

impl CoordinatorHandle {
    pub(crate) fn new(
        events: mpsc::UnboundedSender<CoordinatorEvent>,
        snapshot: watch::Receiver<AppSnapshot>,
        uploads: Arc<UploadGuard>,
    ) -> Self {
        Self {
            events,
            snapshot,
            uploads,
        }
    }

    pub fn send(&self, event: CoordinatorEvent) -> Result<(), CoordinatorError> {
        self.events.send(event).map_err(|_| CoordinatorError::Closed)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> AppSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Wait until a newer snapshot is published. `None` once the coordinator
    /// is gone.
    pub async fn changed(&mut self) -> Option<AppSnapshot> {
        self.snapshot.changed().await.ok()?;
        Some(self.snapshot.borrow_and_update().clone())
    }

    /// Current guard state. Uploads are begun and ended through this handle
    /// so the coordinator hears about every change.
    pub fn upload_status(&self) -> GuardStatus {
        self.uploads.status()
    }

    // Lifecycle

    pub fn launched(&self, launch_payload: Option<Value>) -> Result<(), CoordinatorError> {
        self.send(CoordinatorEvent::Launched { launch_payload })
    }

    pub fn entered_foreground(&self) -> Result<(), CoordinatorError> {
        self.send(CoordinatorEvent::EnteredForeground)
    }

    pub fn entered_background(&self) -> Result<(), CoordinatorError> {
        self.send(CoordinatorEvent::EnteredBackground)
    }

    pub fn terminating(&self) -> Result<(), CoordinatorError> {
        self.send(CoordinatorEvent::Terminating)
    }

    pub fn ui_ready(&self) -> Result<(), CoordinatorError> {
        self.send(CoordinatorEvent::UiReady)
    }

    // Session

    pub fn check_authentication(&self) -> Result<(), CoordinatorError> {
        self.send(CoordinatorEvent::CheckAuthentication)
    }

    pub fn wipe_credentials(&self) -> Result<(), CoordinatorError> {
        self.send(CoordinatorEvent::WipeCredentials)
    }

    pub fn select_blog(&self, blog: Option<BlogRef>) -> Result<(), CoordinatorError> {
        self.send(CoordinatorEvent::ActiveBlogChanged(blog))
    }

    // Push

    pub fn push_received(
        &self,
        payload: Value,
        context: DeliveryContext,
    ) -> Result<(), CoordinatorError> {
        self.send(CoordinatorEvent::PushReceived { payload, context })
    }

    pub fn device_token_received(&self, token: DeviceToken) -> Result<(), CoordinatorError> {
        self.send(CoordinatorEvent::DeviceTokenReceived(token))
    }

    // Alerts

    pub fn show_alert(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        self.send(CoordinatorEvent::ShowAlert(Alert::new(title, message)))
    }

    pub fn alert_dismissed(&self) -> Result<(), CoordinatorError> {
        self.send(CoordinatorEvent::AlertDismissed)
    }

    // Uploads

    /// Claim the upload slot.
    pub fn begin_upload(&self) -> Result<UploadTicket, CoordinatorError> {
        let ticket = self.uploads.begin_upload()?;
        self.uploads_changed();
        Ok(ticket)
    }

    /// Release the slot. Stale tickets are ignored.
    pub fn end_upload(&self, ticket: &UploadTicket) -> bool {
        let released = self.uploads.end_upload(ticket);
        if released {
            self.uploads_changed();
        }
        released
    }

    /// Platform expiration warning. The grant is released before this returns.
    pub fn expiration_warning(&self) -> Option<TicketId> {
        let expired = self.uploads.on_expiration_warning();
        if expired.is_some() {
            self.uploads_changed();
        }
        expired
    }

    fn uploads_changed(&self) {
        if self.send(CoordinatorEvent::UploadStatusChanged).is_err() {
            tracing::trace!("coordinator gone, upload status change not posted");
        }
    }
}

impl std::fmt::Debug for CoordinatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorHandle")
            .field("closed", &self.events.is_closed())
            .field("uploads", &self.uploads)
            .finish()
    }
}
