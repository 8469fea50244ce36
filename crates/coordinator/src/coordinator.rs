//! The application-state coordinator.
//!
//! Sole owner of lifecycle sequencing. Every input (platform lifecycle
//! callbacks, monitor transitions, session check results, push payloads,
//! alert requests) arrives as a [`CoordinatorEvent`] on one queue and is
//! handled in order, so the state below is only ever touched from one place.

use crate::alerts::{Alert, AlertQueue, Enqueued};
use crate::blog::BlogRef;
use crate::collaborators::Collaborators;
use crate::config::{ConfigError, CoordinatorConfig};
use crate::event::CoordinatorEvent;
use crate::handle::CoordinatorHandle;
use crate::snapshot::AppSnapshot;
use lifeline_events::{
    now_ms, publish_to, topics, AlertPresentedEvent, LifecyclePhase, LifecyclePhaseEvent,
    NotificationDispatchedEvent, ReachabilityChangedEvent, SessionChangedEvent,
    UploadAvailabilityEvent,
};
use lifeline_notifications::{
    DeliveryContext, Destination, DeviceToken, NotificationRouter, ReceiveOutcome,
};
use lifeline_reachability::{
    MonitorTarget, ReachabilityCallback, ReachabilityChange, ReachabilityMonitor,
    ReachabilityNotifier, ReachabilityState, TargetKind,
};
use lifeline_session::{Applied, CheckOutcome, SessionState};
use lifeline_uploads::UploadGuard;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

const CONNECTION_LOST_TITLE: &str = "No connection";
const CONNECTION_LOST_MESSAGE: &str =
    "The Internet connection appears to be offline. Changes will be sent once you are back online.";
const SIGNED_OUT_TITLE: &str = "Sign in required";
const SIGNED_OUT_MESSAGE: &str =
    "Your session has expired. Please sign in again to keep publishing.";

/// Last reachability seen per target, as delivered through the queue.
#[derive(Debug, Default, Clone, Copy)]
struct Observed {
    internet: ReachabilityState,
    remote_service: ReachabilityState,
    current_blog: ReachabilityState,
}

impl Observed {
    fn get(&self, kind: TargetKind) -> ReachabilityState {
        match kind {
            TargetKind::Internet => self.internet,
            TargetKind::RemoteService => self.remote_service,
            TargetKind::CurrentBlog => self.current_blog,
        }
    }

    fn set(&mut self, kind: TargetKind, state: ReachabilityState) {
        match kind {
            TargetKind::Internet => self.internet = state,
            TargetKind::RemoteService => self.remote_service = state,
            TargetKind::CurrentBlog => self.current_blog = state,
        }
    }
}

pub struct Coordinator {
    config: CoordinatorConfig,
    collaborators: Collaborators,
    phase: LifecyclePhase,

    internet: ReachabilityMonitor,
    remote_service: ReachabilityMonitor,
    current_blog: ReachabilityMonitor,
    observed: Observed,

    session: SessionState,
    uploads: Arc<UploadGuard>,
    uploads_allowed: bool,
    router: NotificationRouter,
    alerts: AlertQueue,
    active_blog: Option<BlogRef>,
    device_token: Option<DeviceToken>,

    tx: mpsc::UnboundedSender<CoordinatorEvent>,
    rx: mpsc::UnboundedReceiver<CoordinatorEvent>,
    snapshot_tx: watch::Sender<AppSnapshot>,
}

impl Coordinator {
    /// Build the coordinator. Monitors are created but not started.
    pub fn new(config: CoordinatorConfig, collaborators: Collaborators) -> Result<Self, ConfigError> {
        config.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(AppSnapshot::default());
        let uploads = Arc::new(UploadGuard::with_event_bus(
            Arc::clone(&collaborators.background),
            Arc::clone(&collaborators.events),
        ));
        let router = NotificationRouter::new(Arc::clone(&collaborators.dispatcher));
        let alerts = AlertQueue::new(config.alerts.clone());

        Ok(Self {
            config,
            collaborators,
            phase: LifecyclePhase::NotLaunched,
            internet: ReachabilityMonitor::new(TargetKind::Internet),
            remote_service: ReachabilityMonitor::new(TargetKind::RemoteService),
            current_blog: ReachabilityMonitor::new(TargetKind::CurrentBlog),
            observed: Observed::default(),
            session: SessionState::new(),
            uploads,
            uploads_allowed: false,
            router,
            alerts,
            active_blog: None,
            device_token: None,
            tx,
            rx,
            snapshot_tx,
        })
    }

    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle::new(
            self.tx.clone(),
            self.snapshot_tx.subscribe(),
            Arc::clone(&self.uploads),
        )
    }

    /// Entry point for the platform's raw link-state callback of one target.
    pub fn notifier(&self, kind: TargetKind) -> ReachabilityNotifier {
        self.monitor(kind).notifier()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            phase: self.phase,
            internet: self.observed.internet,
            remote_service: self.observed.remote_service,
            current_blog: self.observed.current_blog,
            authenticated: self.session.is_authenticated(),
            session_check_in_flight: self.session.is_checking(),
            uploads: self.uploads.status(),
            uploads_allowed: self.uploads_allowed,
            ui_ready: self.router.is_ui_ready(),
            alert: self.alerts.current().cloned(),
            alerts_queued: self.alerts.queued_len(),
            pending_notification: self.router.pending().cloned(),
            active_blog: self.active_blog.clone(),
        }
    }

    /// Handle every event already queued, in order. Returns how many ran.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next event and handle it.
    pub async fn step(&mut self) {
        // The coordinator holds a sender, so the queue never closes under us.
        if let Some(event) = self.rx.recv().await {
            self.dispatch(event);
        }
    }

    /// Handle events until termination or `shutdown`.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        tracing::info!("coordinator started");
        loop {
            let event = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!("coordinator shutdown requested");
                    break;
                }
                event = self.rx.recv() => event,
            };
            let Some(event) = event else {
                break;
            };

            self.dispatch(event);
            if self.phase == LifecyclePhase::Terminated {
                break;
            }
        }
        tracing::info!(phase = %self.phase, "coordinator stopped");
    }

    /// Handle one event on the calling context and publish the new snapshot.
    pub fn dispatch(&mut self, event: CoordinatorEvent) {
        tracing::trace!(event = event.name(), phase = %self.phase, "handling event");

        match event {
            CoordinatorEvent::Launched { launch_payload } => self.on_launched(launch_payload),
            CoordinatorEvent::EnteredForeground => self.on_foreground(),
            CoordinatorEvent::EnteredBackground => self.on_background(),
            CoordinatorEvent::Terminating => self.on_terminating(),
            CoordinatorEvent::UiReady => self.on_ui_ready(),
            CoordinatorEvent::ReachabilityChanged(change) => self.on_reachability_changed(change),
            CoordinatorEvent::CheckAuthentication => self.start_session_check("requested"),
            CoordinatorEvent::SessionChecked {
                generation,
                outcome,
            } => self.on_session_checked(generation, outcome),
            CoordinatorEvent::PushReceived { payload, context } => {
                self.route_push(payload, context)
            }
            CoordinatorEvent::DeviceTokenReceived(token) => {
                tracing::info!(token = %token, "push registration succeeded");
                self.device_token = Some(token);
            }
            CoordinatorEvent::PushRegistrationFailed(reason) => {
                tracing::warn!(reason = %reason, "push registration failed");
            }
            CoordinatorEvent::UploadStatusChanged => self.on_upload_status_changed(),
            CoordinatorEvent::ActiveBlogChanged(blog) => self.on_active_blog_changed(blog),
            CoordinatorEvent::ShowAlert(alert) => self.request_alert(alert),
            CoordinatorEvent::AlertDismissed => self.on_alert_dismissed(),
            CoordinatorEvent::WipeCredentials => self.tear_down("credentials_wiped"),
        }

        self.snapshot_tx.send_replace(self.snapshot());
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    fn on_launched(&mut self, launch_payload: Option<Value>) {
        if self.phase != LifecyclePhase::NotLaunched {
            tracing::warn!(phase = %self.phase, "launch reported twice, ignoring");
            return;
        }
        self.set_phase(LifecyclePhase::Launched);

        self.collaborators.push.register();
        if let Some(payload) = launch_payload {
            self.route_push(payload, DeliveryContext::Launch);
        }
        self.active_blog = self.collaborators.blogs.current();
        tracing::debug!(blog = ?self.active_blog, "active blog restored");
    }

    fn on_foreground(&mut self) {
        match self.phase {
            LifecyclePhase::Terminated => {
                tracing::warn!("foreground after termination, ignoring");
                return;
            }
            LifecyclePhase::NotLaunched => {
                tracing::warn!("foreground before launch");
            }
            _ => {}
        }
        self.set_phase(LifecyclePhase::Foreground);

        self.start_monitor(TargetKind::Internet);
        self.start_monitor(TargetKind::RemoteService);
        self.start_monitor(TargetKind::CurrentBlog);
        self.start_session_check("foreground");
        self.flush_notifications();
    }

    fn on_background(&mut self) {
        if self.phase == LifecyclePhase::Terminated {
            tracing::warn!("background after termination, ignoring");
            return;
        }
        self.set_phase(LifecyclePhase::Background);

        if self.uploads.is_in_progress() {
            let granted = self.uploads.ensure_grant();
            tracing::info!(granted, "upload in progress while entering background");
        }
        self.apply_background_policy();
    }

    fn on_terminating(&mut self) {
        if self.phase == LifecyclePhase::Terminated {
            return;
        }
        self.tear_down("terminating");
        self.router.reset_ui();
        self.set_phase(LifecyclePhase::Terminated);
    }

    /// Shared by termination and credential wipe.
    fn tear_down(&mut self, reason: &'static str) {
        tracing::info!(reason, "tearing down session state");

        for kind in TargetKind::ALL {
            self.stop_monitor(kind);
        }

        if self.session.clear() {
            self.publish(
                topics::SESSION_CHANGED,
                &SessionChangedEvent {
                    authenticated: false,
                    reason: "cleared".to_string(),
                    timestamp_ms: now_ms(),
                },
            );
        }

        self.active_blog = None;
        self.collaborators.blogs.clear();
        self.observed.current_blog = ReachabilityState::Unknown;
        self.refresh_upload_availability();

        self.collaborators.credentials.wipe_all();
        if let Some(token) = self.device_token.take() {
            self.collaborators.push.unregister(&token);
        }

        self.alerts.clear();
        if self.router.discard_pending() {
            tracing::debug!("pending notification discarded");
        }
    }

    fn set_phase(&mut self, phase: LifecyclePhase) {
        if phase == self.phase {
            return;
        }
        let previous = std::mem::replace(&mut self.phase, phase);
        tracing::info!(previous = %previous, phase = %phase, "lifecycle phase changed");
        self.publish(
            topics::LIFECYCLE_PHASE,
            &LifecyclePhaseEvent {
                previous,
                phase,
                timestamp_ms: now_ms(),
            },
        );
    }

    // ------------------------------------------------------------------
    // Reachability
    // ------------------------------------------------------------------

    fn monitor(&self, kind: TargetKind) -> &ReachabilityMonitor {
        match kind {
            TargetKind::Internet => &self.internet,
            TargetKind::RemoteService => &self.remote_service,
            TargetKind::CurrentBlog => &self.current_blog,
        }
    }

    fn monitor_mut(&mut self, kind: TargetKind) -> &mut ReachabilityMonitor {
        match kind {
            TargetKind::Internet => &mut self.internet,
            TargetKind::RemoteService => &mut self.remote_service,
            TargetKind::CurrentBlog => &mut self.current_blog,
        }
    }

    fn target(&self, kind: TargetKind) -> Option<MonitorTarget> {
        match kind {
            TargetKind::Internet => Some(MonitorTarget::internet()),
            TargetKind::RemoteService => Some(MonitorTarget::remote_service(
                self.config.remote_service_host.clone(),
            )),
            TargetKind::CurrentBlog => self
                .active_blog
                .as_ref()
                .and_then(BlogRef::host)
                .map(MonitorTarget::current_blog),
        }
    }

    /// Start (or re-target) one monitor. A current-blog monitor without a
    /// blog to watch is stopped instead.
    fn start_monitor(&mut self, kind: TargetKind) {
        let Some(target) = self.target(kind) else {
            tracing::debug!(target_kind = %kind, "nothing to monitor");
            self.stop_monitor(kind);
            return;
        };

        let tx = self.tx.clone();
        let callback: ReachabilityCallback = Arc::new(move |change| {
            if tx.send(CoordinatorEvent::ReachabilityChanged(change)).is_err() {
                tracing::trace!("coordinator gone, dropping reachability change");
            }
        });

        let probe = self.collaborators.probe.clone();
        let interval = self.config.poll_interval();
        let monitor = self.monitor_mut(kind);
        monitor.start(target, callback);
        if let (Some(probe), Some(interval)) = (probe, interval) {
            monitor.spawn_polling(probe, interval);
        }

        // The monitor keeps its state across restarts, so resync the view.
        let state = monitor.current_state();
        self.observed.set(kind, state);
        if kind == TargetKind::CurrentBlog {
            self.refresh_upload_availability();
        }
    }

    fn stop_monitor(&mut self, kind: TargetKind) {
        self.monitor_mut(kind).stop();
    }

    fn on_reachability_changed(&mut self, change: ReachabilityChange) {
        let watched_host = self.target(change.kind).map(|target| target.host);
        if watched_host.as_ref() != Some(&change.host) {
            tracing::debug!(target_kind = %change.kind, host = ?change.host, "change for a previous host, ignoring");
            return;
        }

        self.observed.set(change.kind, change.current);
        self.publish(
            topics::REACHABILITY_CHANGED,
            &ReachabilityChangedEvent::from(&change),
        );

        match change.kind {
            TargetKind::Internet => {
                if change.current == ReachabilityState::Unreachable
                    && self.phase == LifecyclePhase::Foreground
                    && self.config.alert_on_connection_loss
                {
                    self.request_alert(Alert::new(CONNECTION_LOST_TITLE, CONNECTION_LOST_MESSAGE));
                }
            }
            TargetKind::RemoteService => {
                if change.current == ReachabilityState::Unreachable {
                    // Recovery may pass through Unknown, so owe the check now.
                    self.session.defer();
                } else if change.current.is_reachable()
                    && (change.regained() || self.session.retry_owed())
                {
                    self.start_session_check("reachability_regained");
                }
            }
            TargetKind::CurrentBlog => self.refresh_upload_availability(),
        }
    }

    fn refresh_upload_availability(&mut self) {
        let blog_state = self.observed.get(TargetKind::CurrentBlog);
        let allowed = blog_state.allows_uploads();
        if allowed == self.uploads_allowed {
            return;
        }
        self.uploads_allowed = allowed;
        tracing::info!(allowed, blog_state = %blog_state, "upload availability changed");
        self.publish(
            topics::UPLOAD_AVAILABILITY,
            &UploadAvailabilityEvent {
                allowed,
                blog_state,
            },
        );
    }

    fn on_active_blog_changed(&mut self, blog: Option<BlogRef>) {
        if blog == self.active_blog {
            return;
        }
        tracing::info!(blog = ?blog, "active blog changed");
        self.active_blog = blog;

        let watching = self.phase == LifecyclePhase::Foreground || self.current_blog.is_running();
        if self.active_blog.is_none() {
            self.stop_monitor(TargetKind::CurrentBlog);
            self.observed.current_blog = ReachabilityState::Unknown;
            self.refresh_upload_availability();
        } else if watching {
            self.start_monitor(TargetKind::CurrentBlog);
        }
    }

    // ------------------------------------------------------------------
    // Uploads
    // ------------------------------------------------------------------

    fn on_upload_status_changed(&mut self) {
        tracing::debug!(status = ?self.uploads.status(), "upload status changed");
        if self.phase == LifecyclePhase::Background {
            self.apply_background_policy();
        }
    }

    /// Decide which monitors run while backgrounded.
    fn apply_background_policy(&mut self) {
        let policy = &self.config.background;
        if policy.keep_all_monitors {
            return;
        }
        let keep_blog = policy.keep_blog_monitor_for_uploads && self.uploads.is_in_progress();

        self.stop_monitor(TargetKind::Internet);
        self.stop_monitor(TargetKind::RemoteService);
        if keep_blog {
            self.start_monitor(TargetKind::CurrentBlog);
        } else {
            self.stop_monitor(TargetKind::CurrentBlog);
        }
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    fn start_session_check(&mut self, trigger: &'static str) {
        if self.observed.remote_service == ReachabilityState::Unreachable {
            tracing::debug!(trigger, "remote service unreachable, deferring session check");
            self.session.defer();
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(trigger, "no tokio runtime, deferring session check");
            self.session.defer();
            return;
        };

        let pending = self.session.begin_check();
        let generation = pending.generation();
        tracing::debug!(trigger, generation, "session check started");

        let store = Arc::clone(&self.collaborators.credentials);
        let authenticator = Arc::clone(&self.collaborators.authenticator);
        let timeout = self.config.session_check_timeout();
        let tx = self.tx.clone();

        runtime.spawn(async move {
            let Some(outcome) = pending.run(store, authenticator, timeout).await else {
                return;
            };
            if tx
                .send(CoordinatorEvent::SessionChecked {
                    generation,
                    outcome,
                })
                .is_err()
            {
                tracing::trace!(generation, "coordinator gone, dropping session check result");
            }
        });
    }

    fn on_session_checked(&mut self, generation: u64, outcome: CheckOutcome) {
        match self.session.apply(generation, &outcome) {
            Applied::Changed { authenticated } => {
                self.publish(
                    topics::SESSION_CHANGED,
                    &SessionChangedEvent {
                        authenticated,
                        reason: "checked".to_string(),
                        timestamp_ms: now_ms(),
                    },
                );
                if !authenticated {
                    self.request_alert(Alert::new(SIGNED_OUT_TITLE, SIGNED_OUT_MESSAGE));
                }
            }
            Applied::Failed => {
                tracing::debug!(outcome = outcome.label(), "session check will be retried");
            }
            Applied::Unchanged | Applied::Stale => {}
        }
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    fn route_push(&mut self, payload: Value, context: DeliveryContext) {
        match self.router.receive(payload, context) {
            ReceiveOutcome::Consumed(destination) => {
                self.publish_dispatched(&destination, context, false)
            }
            ReceiveOutcome::Deferred => {}
        }
    }

    fn on_ui_ready(&mut self) {
        if let Some((destination, context)) = self.router.mark_ui_ready() {
            self.publish_dispatched(&destination, context, true);
        }
    }

    fn flush_notifications(&mut self) {
        if let Some((destination, context)) = self.router.flush_pending() {
            self.publish_dispatched(&destination, context, true);
        }
    }

    fn publish_dispatched(&self, destination: &Destination, context: DeliveryContext, was_deferred: bool) {
        self.publish(
            topics::NOTIFICATION_DISPATCHED,
            &NotificationDispatchedEvent {
                destination: destination.label().to_string(),
                context: context.label().to_string(),
                was_deferred,
            },
        );
    }

    // ------------------------------------------------------------------
    // Alerts
    // ------------------------------------------------------------------

    fn request_alert(&mut self, alert: Alert) {
        match self.alerts.request(alert) {
            Enqueued::Presented => self.present_current_alert(),
            Enqueued::Queued { position } => {
                tracing::debug!(position, "alert queued behind the visible one");
            }
            Enqueued::Dropped => {}
        }
    }

    fn on_alert_dismissed(&mut self) {
        if self.alerts.dismiss().is_some() {
            self.present_current_alert();
        }
    }

    fn present_current_alert(&self) {
        let Some(alert) = self.alerts.current() else {
            return;
        };
        self.collaborators.alerts.present(alert);
        self.publish(
            topics::ALERT_PRESENTED,
            &AlertPresentedEvent {
                title: alert.title.clone(),
                message: alert.message.clone(),
                queued: self.alerts.queued_len(),
            },
        );
    }

    fn publish<T: Serialize>(&self, topic: &str, event: &T) {
        publish_to(self.collaborators.events.as_ref(), topic, event);
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("phase", &self.phase)
            .field("observed", &self.observed)
            .field("authenticated", &self.session.is_authenticated())
            .field("uploads", &self.uploads)
            .field("alerts", &self.alerts)
            .field("active_blog", &self.active_blog)
            .finish_non_exhaustive()
    }
}
