//! External collaborators the coordinator calls into.
//!
//! Everything is injected at construction; nothing is looked up globally.

use crate::alerts::{Alert, AlertPresenter};
use crate::blog::{BlogStore, InMemoryBlogStore};
use lifeline_events::{EventBusRef, NullEventBus};
use lifeline_notifications::{DeliveryContext, Destination, Dispatcher, NullPushRegistrar, PushRegistrar};
use lifeline_reachability::ReachabilityProbe;
use lifeline_session::{Authenticator, CheckError, CredentialStore, Credentials, InMemoryCredentialStore};
use lifeline_uploads::{BackgroundExecution, UnsupportedBackgroundExecution};
use std::sync::Arc;

pub struct Collaborators {
    pub credentials: Arc<dyn CredentialStore>,
    pub authenticator: Arc<dyn Authenticator>,
    pub dispatcher: Arc<dyn Dispatcher>,
    pub alerts: Arc<dyn AlertPresenter>,
    pub push: Arc<dyn PushRegistrar>,
    pub blogs: Arc<dyn BlogStore>,
    pub background: Arc<dyn BackgroundExecution>,
    /// Drives the monitors by polling. Without one, observations only arrive
    /// through [`Coordinator::notifier`](crate::Coordinator::notifier).
    pub probe: Option<Arc<dyn ReachabilityProbe>>,
    pub events: EventBusRef,
}

impl Collaborators {
    /// Inert collaborators: no credentials, no UI, no push, no probe.
    /// Swap in real ones with struct update syntax.
    pub fn detached() -> Self {
        Self {
            credentials: Arc::new(InMemoryCredentialStore::new()),
            authenticator: Arc::new(RejectingAuthenticator),
            dispatcher: Arc::new(LoggingDispatcher),
            alerts: Arc::new(LoggingAlertPresenter),
            push: Arc::new(NullPushRegistrar),
            blogs: Arc::new(InMemoryBlogStore::default()),
            background: Arc::new(UnsupportedBackgroundExecution),
            probe: None,
            events: Arc::new(NullEventBus),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("probe", &self.probe.is_some())
            .finish_non_exhaustive()
    }
}

/// Authenticator that rejects everything.
pub struct RejectingAuthenticator;

#[async_trait::async_trait]
impl Authenticator for RejectingAuthenticator {
    async fn verify(&self, _credentials: &Credentials) -> Result<bool, CheckError> {
        Ok(false)
    }
}

/// Dispatcher that only logs where it would navigate.
pub struct LoggingDispatcher;

impl Dispatcher for LoggingDispatcher {
    fn dispatch(&self, destination: &Destination, context: DeliveryContext) {
        tracing::info!(?destination, context = context.label(), "navigate");
    }
}

/// Presenter that logs alerts instead of showing them.
pub struct LoggingAlertPresenter;

impl AlertPresenter for LoggingAlertPresenter {
    fn present(&self, alert: &Alert) {
        tracing::info!(title = %alert.title, message = %alert.message, "alert");
    }
}
