//! End-to-end scenarios for the coordinator.
//!
//! Every collaborator is a recording fake; reachability is driven through
//! the monitors' notifiers instead of a real probe.

use async_trait::async_trait;
use lifeline_coordinator::{
    Alert, AlertPresenter, BlogRef, BlogStore, Collaborators, Coordinator, CoordinatorConfig,
    CoordinatorError, CoordinatorEvent, CoordinatorHandle, InMemoryBlogStore,
};
use lifeline_events::{topics, InMemoryEventBus, LifecyclePhase};
use lifeline_notifications::{
    DeliveryContext, Destination, DeviceToken, Dispatcher, PushRegistrar,
};
use lifeline_reachability::{ReachabilityFlags, ReachabilityState, TargetKind};
use lifeline_session::{
    Authenticator, CheckError, CredentialStore, Credentials, InMemoryCredentialStore,
};
use lifeline_uploads::{BackgroundExecution, GrantId, GuardStatus, UploadError};
use serde_json::json;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct RecordingDispatcher {
    calls: Mutex<Vec<(Destination, DeliveryContext)>>,
}

impl RecordingDispatcher {
    fn calls(&self) -> Vec<(Destination, DeliveryContext)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&self, destination: &Destination, context: DeliveryContext) {
        self.calls.lock().unwrap().push((destination.clone(), context));
    }
}

#[derive(Default)]
struct RecordingPresenter {
    shown: Mutex<Vec<Alert>>,
}

impl RecordingPresenter {
    fn titles(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|alert| alert.title.clone())
            .collect()
    }
}

impl AlertPresenter for RecordingPresenter {
    fn present(&self, alert: &Alert) {
        self.shown.lock().unwrap().push(alert.clone());
    }
}

#[derive(Default)]
struct RecordingRegistrar {
    registrations: AtomicUsize,
    unregistered: Mutex<Vec<DeviceToken>>,
}

impl PushRegistrar for RecordingRegistrar {
    fn register(&self) {
        self.registrations.fetch_add(1, Ordering::SeqCst);
    }

    fn unregister(&self, token: &DeviceToken) {
        self.unregistered.lock().unwrap().push(token.clone());
    }
}

#[derive(Default)]
struct RecordingExecution {
    next: AtomicU64,
    ended: Mutex<Vec<GrantId>>,
}

impl BackgroundExecution for RecordingExecution {
    fn begin(&self, _name: &str) -> Option<GrantId> {
        Some(GrantId(self.next.fetch_add(1, Ordering::SeqCst) + 1))
    }

    fn end(&self, grant: GrantId) {
        self.ended.lock().unwrap().push(grant);
    }
}

/// Answers with whatever verdict is currently set, after `delay`.
struct ScriptedAuthenticator {
    verdict: Mutex<Result<bool, CheckError>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedAuthenticator {
    fn new(verdict: Result<bool, CheckError>) -> Self {
        Self {
            verdict: Mutex::new(verdict),
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
        }
    }

    fn set(&self, verdict: Result<bool, CheckError>) {
        *self.verdict.lock().unwrap() = verdict;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for ScriptedAuthenticator {
    async fn verify(&self, _credentials: &Credentials) -> Result<bool, CheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.verdict.lock().unwrap().clone()
    }
}

struct Harness {
    coordinator: Coordinator,
    handle: CoordinatorHandle,
    dispatcher: Arc<RecordingDispatcher>,
    presenter: Arc<RecordingPresenter>,
    registrar: Arc<RecordingRegistrar>,
    execution: Arc<RecordingExecution>,
    authenticator: Arc<ScriptedAuthenticator>,
    credentials: Arc<InMemoryCredentialStore>,
    blogs: Arc<InMemoryBlogStore>,
    bus: Arc<InMemoryEventBus>,
}

fn harness() -> Harness {
    harness_with(CoordinatorConfig {
        poll_interval_ms: 0,
        ..Default::default()
    })
}

fn harness_with(config: CoordinatorConfig) -> Harness {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let presenter = Arc::new(RecordingPresenter::default());
    let registrar = Arc::new(RecordingRegistrar::default());
    let execution = Arc::new(RecordingExecution::default());
    let authenticator = Arc::new(ScriptedAuthenticator::new(Ok(true)));
    let credentials = Arc::new(InMemoryCredentialStore::with_credentials(Credentials::new(
        "editor", "hunter2",
    )));
    let blogs = Arc::new(InMemoryBlogStore::new(Some(BlogRef::new(
        7,
        "https://blog.example.com",
    ))));
    let bus = Arc::new(InMemoryEventBus::new());

    let collaborators = Collaborators {
        credentials: credentials.clone(),
        authenticator: authenticator.clone(),
        dispatcher: dispatcher.clone(),
        alerts: presenter.clone(),
        push: registrar.clone(),
        blogs: blogs.clone(),
        background: execution.clone(),
        probe: None,
        events: bus.clone(),
    };
    let coordinator = Coordinator::new(config, collaborators).expect("valid config");
    let handle = coordinator.handle();

    Harness {
        coordinator,
        handle,
        dispatcher,
        presenter,
        registrar,
        execution,
        authenticator,
        credentials,
        blogs,
        bus,
    }
}

impl Harness {
    fn send(&mut self, event: CoordinatorEvent) {
        self.handle.send(event).unwrap();
        self.coordinator.process_pending();
    }

    fn launch(&mut self) {
        self.send(CoordinatorEvent::Launched {
            launch_payload: None,
        });
    }

    fn observe(&mut self, kind: TargetKind, flags: ReachabilityFlags) {
        self.coordinator.notifier(kind).notify(Ok(flags));
        self.coordinator.process_pending();
    }
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_launch_registers_push_and_restores_blog() {
        let mut h = harness();
        h.launch();

        let snapshot = h.handle.snapshot();
        assert_eq!(snapshot.phase, LifecyclePhase::Launched);
        assert_eq!(snapshot.active_blog, Some(BlogRef::new(7, "https://blog.example.com")));
        assert_eq!(h.registrar.registrations.load(Ordering::SeqCst), 1);
        // Monitors exist but are not started yet.
        assert!(h
            .coordinator
            .notifier(TargetKind::Internet)
            .notify(Ok(ReachabilityFlags::wifi()))
            .is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_starts_monitors_and_checks_session() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);

        for kind in TargetKind::ALL {
            assert!(
                h.coordinator
                    .notifier(kind)
                    .notify(Ok(ReachabilityFlags::wifi()))
                    .is_some(),
                "{} monitor should be running",
                kind
            );
        }
        h.coordinator.process_pending();

        h.coordinator.step().await;
        let snapshot = h.handle.snapshot();
        assert!(snapshot.authenticated);
        assert!(snapshot.is_usable());
        assert!(snapshot.uploads_allowed);
        assert_eq!(h.authenticator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_keeps_blog_monitor_only_while_uploading() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);

        let ticket = h.handle.begin_upload().unwrap();
        h.send(CoordinatorEvent::EnteredBackground);

        assert!(h
            .coordinator
            .notifier(TargetKind::Internet)
            .notify(Ok(ReachabilityFlags::wifi()))
            .is_none());
        assert!(h
            .coordinator
            .notifier(TargetKind::CurrentBlog)
            .notify(Ok(ReachabilityFlags::wifi()))
            .is_some());

        assert!(h.handle.end_upload(&ticket));
        h.coordinator.process_pending();
        assert!(h
            .coordinator
            .notifier(TargetKind::CurrentBlog)
            .notify(Ok(ReachabilityFlags::unreachable()))
            .is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminate_tears_everything_down() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);
        h.coordinator.step().await;
        h.send(CoordinatorEvent::DeviceTokenReceived(
            DeviceToken::from_bytes(&[0xab, 0xcd]),
        ));

        h.handle.terminating().unwrap();
        h.coordinator.run(CancellationToken::new()).await;

        let snapshot = h.handle.snapshot();
        assert_eq!(snapshot.phase, LifecyclePhase::Terminated);
        assert!(!snapshot.authenticated);
        assert!(snapshot.active_blog.is_none());
        assert!(h.blogs.current().is_none());
        assert!(h.credentials.lookup().is_none());
        assert_eq!(
            *h.registrar.unregistered.lock().unwrap(),
            vec![DeviceToken::from_bytes(&[0xab, 0xcd])]
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut h = harness();
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        h.coordinator.run(shutdown).await;
        assert_eq!(h.handle.snapshot().phase, LifecyclePhase::NotLaunched);
    }
}

// =============================================================================
// Notification Routing Tests
// =============================================================================

mod notifications {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_launch_payload_deferred_then_dispatched_once() {
        let mut h = harness();
        h.send(CoordinatorEvent::Launched {
            launch_payload: Some(json!({"type": "comment", "post_id": 42, "blog_id": 7})),
        });

        assert!(h.handle.snapshot().pending_notification.is_some());
        assert!(h.dispatcher.calls().is_empty());

        h.send(CoordinatorEvent::EnteredForeground);
        assert!(h.dispatcher.calls().is_empty(), "UI not ready yet");

        h.send(CoordinatorEvent::UiReady);
        let expected = (
            Destination::Comment {
                blog_id: Some(7),
                post_id: 42,
                comment_id: None,
            },
            DeliveryContext::Launch,
        );
        assert_eq!(h.dispatcher.calls(), vec![expected.clone()]);

        // Later readiness signals and foregrounds dispatch nothing more.
        h.send(CoordinatorEvent::UiReady);
        h.send(CoordinatorEvent::EnteredBackground);
        h.send(CoordinatorEvent::EnteredForeground);
        assert_eq!(h.dispatcher.calls(), vec![expected]);
        assert!(h.handle.snapshot().pending_notification.is_none());

        let dispatched = h.bus.events_for(topics::NOTIFICATION_DISPATCHED);
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].payload["was_deferred"], true);
    }

    #[tokio::test]
    async fn test_flush_without_payload_is_noop() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::UiReady);
        h.send(CoordinatorEvent::EnteredForeground);

        assert!(h.dispatcher.calls().is_empty());
        assert!(h.bus.events_for(topics::NOTIFICATION_DISPATCHED).is_empty());
    }

    #[tokio::test]
    async fn test_second_payload_overwrites_first() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::PushReceived {
            payload: json!({"type": "like", "note_id": 1}),
            context: DeliveryContext::Background,
        });
        h.send(CoordinatorEvent::PushReceived {
            payload: json!({"type": "reader", "blog_id": 3, "post_id": 4}),
            context: DeliveryContext::Foreground,
        });

        let pending = h.handle.snapshot().pending_notification.unwrap();
        assert_eq!(pending.context, DeliveryContext::Foreground);

        h.send(CoordinatorEvent::UiReady);
        assert_eq!(
            h.dispatcher.calls(),
            vec![(
                Destination::ReaderPost {
                    blog_id: 3,
                    post_id: 4
                },
                DeliveryContext::Foreground
            )]
        );
    }

    #[tokio::test]
    async fn test_ready_ui_dispatches_immediately_with_fallback() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::UiReady);
        h.send(CoordinatorEvent::PushReceived {
            payload: json!(["not", "an", "object"]),
            context: DeliveryContext::Foreground,
        });

        assert_eq!(
            h.dispatcher.calls(),
            vec![(Destination::Fallback, DeliveryContext::Foreground)]
        );
        assert!(h.handle.snapshot().pending_notification.is_none());
    }
}

// =============================================================================
// Upload Guard Tests
// =============================================================================

mod uploads {
    use super::*;

    #[tokio::test]
    async fn test_expiration_while_backgrounded_returns_to_idle() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);

        let ticket = h.handle.begin_upload().unwrap();
        h.send(CoordinatorEvent::EnteredBackground);

        assert_eq!(h.handle.expiration_warning(), Some(ticket.id()));
        // Released synchronously, before the queue is even drained.
        assert_eq!(h.handle.upload_status(), GuardStatus::Idle);
        assert_eq!(*h.execution.ended.lock().unwrap(), vec![GrantId(1)]);

        h.coordinator.process_pending();
        assert_eq!(h.handle.snapshot().uploads, GuardStatus::Idle);

        // The uploader finishing late is harmless.
        assert!(!h.handle.end_upload(&ticket));
        assert_eq!(h.execution.ended.lock().unwrap().len(), 1);

        let stages: Vec<_> = h
            .bus
            .events_for(topics::UPLOAD_LIFECYCLE)
            .into_iter()
            .map(|e| e.payload["stage"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(stages, vec!["started", "expired"]);
    }

    #[tokio::test]
    async fn test_second_upload_rejected() {
        let h = harness();
        let first = h.handle.begin_upload().unwrap();

        match h.handle.begin_upload() {
            Err(CoordinatorError::Upload(UploadError::AlreadyInProgress { active })) => {
                assert_eq!(active, first.id());
            }
            other => panic!("expected AlreadyInProgress, got {:?}", other.map(|t| t.id())),
        }

        assert!(h.handle.end_upload(&first));
        assert!(!h.handle.end_upload(&first));
        assert!(h.handle.begin_upload().is_ok());
    }

    #[tokio::test]
    async fn test_ending_upload_in_background_stops_blog_monitor() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);

        let ticket = h.handle.begin_upload().unwrap();
        assert!(h.handle.upload_status().is_in_progress());
        h.send(CoordinatorEvent::EnteredBackground);

        let blog = h.coordinator.notifier(TargetKind::CurrentBlog);
        assert!(blog.notify(Ok(ReachabilityFlags::wifi())).is_some(), "kept for the upload");

        assert!(h.handle.end_upload(&ticket));
        h.coordinator.process_pending();

        assert_eq!(h.handle.upload_status(), GuardStatus::Idle);
        assert_eq!(h.handle.snapshot().uploads, GuardStatus::Idle);
        assert!(blog.notify(Ok(ReachabilityFlags::cellular())).is_none());
    }

    #[tokio::test]
    async fn test_blog_reachability_gates_uploads() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);
        assert!(!h.handle.snapshot().uploads_allowed, "unknown counts as unreachable");

        h.observe(TargetKind::CurrentBlog, ReachabilityFlags::cellular());
        assert!(h.handle.snapshot().uploads_allowed);

        h.observe(TargetKind::CurrentBlog, ReachabilityFlags::unreachable());
        assert!(!h.handle.snapshot().uploads_allowed);

        let availability = h.bus.events_for(topics::UPLOAD_AVAILABILITY);
        assert_eq!(availability.len(), 2);
        assert_eq!(availability[1].payload["allowed"], false);
    }
}

// =============================================================================
// Reachability Tests
// =============================================================================

mod reachability {
    use super::*;

    #[tokio::test]
    async fn test_blog_change_restarts_blog_monitor() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);
        h.observe(TargetKind::CurrentBlog, ReachabilityFlags::wifi());
        assert_eq!(h.handle.snapshot().current_blog, ReachabilityState::ReachableViaWiFi);

        h.send(CoordinatorEvent::ActiveBlogChanged(Some(BlogRef::new(
            8,
            "https://other.example.org",
        ))));
        let snapshot = h.handle.snapshot();
        assert_eq!(snapshot.current_blog, ReachabilityState::Unknown);
        assert!(!snapshot.uploads_allowed);

        h.observe(TargetKind::CurrentBlog, ReachabilityFlags::unreachable());
        assert_eq!(h.handle.snapshot().current_blog, ReachabilityState::Unreachable);

        let hosts: Vec<_> = h
            .bus
            .events_for(topics::REACHABILITY_CHANGED)
            .into_iter()
            .filter(|e| e.payload["target"] == "current_blog")
            .map(|e| e.payload["host"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            hosts,
            vec!["blog.example.com", "other.example.org", "other.example.org"]
        );
    }

    #[tokio::test]
    async fn test_deselecting_blog_stops_monitor() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);
        h.observe(TargetKind::CurrentBlog, ReachabilityFlags::wifi());

        h.send(CoordinatorEvent::ActiveBlogChanged(None));
        assert_eq!(h.handle.snapshot().current_blog, ReachabilityState::Unknown);
        assert!(h
            .coordinator
            .notifier(TargetKind::CurrentBlog)
            .notify(Ok(ReachabilityFlags::wifi()))
            .is_none());
    }

    #[tokio::test]
    async fn test_connection_alert_only_in_foreground() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);
        h.observe(TargetKind::Internet, ReachabilityFlags::wifi());
        h.observe(TargetKind::Internet, ReachabilityFlags::unreachable());
        assert_eq!(h.presenter.titles(), vec!["No connection"]);

        h.send(CoordinatorEvent::AlertDismissed);
        h.send(CoordinatorEvent::EnteredBackground);
        // Stopped monitors ignore observations, so nothing can alert.
        h.observe(TargetKind::Internet, ReachabilityFlags::wifi());
        h.observe(TargetKind::Internet, ReachabilityFlags::unreachable());
        assert_eq!(h.presenter.titles().len(), 1);
    }

    #[tokio::test]
    async fn test_connection_alert_can_be_disabled() {
        let mut h = harness_with(CoordinatorConfig {
            poll_interval_ms: 0,
            alert_on_connection_loss: false,
            ..Default::default()
        });
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);
        h.observe(TargetKind::Internet, ReachabilityFlags::unreachable());

        assert_eq!(h.handle.snapshot().internet, ReachabilityState::Unreachable);
        assert!(h.presenter.titles().is_empty());
    }
}

// =============================================================================
// Session Tests
// =============================================================================

mod session {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_checks_collapse_to_latest() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::CheckAuthentication);
        h.send(CoordinatorEvent::CheckAuthentication);
        h.send(CoordinatorEvent::CheckAuthentication);

        h.coordinator.step().await;
        assert!(h.handle.snapshot().authenticated);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(h.coordinator.process_pending(), 0, "superseded checks report nothing");
        assert_eq!(h.bus.events_for(topics::SESSION_CHANGED).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_check_keeps_flag_and_retries_on_reachability() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);
        h.coordinator.step().await;
        assert!(h.handle.snapshot().authenticated);

        h.authenticator
            .set(Err(CheckError::Transport("connection reset".to_string())));
        h.send(CoordinatorEvent::CheckAuthentication);
        h.coordinator.step().await;
        assert!(h.handle.snapshot().authenticated, "failure keeps the last known flag");
        assert!(h.presenter.titles().is_empty(), "failures are never shown");

        // Any reachable report from the remote service pays the owed retry.
        h.authenticator.set(Ok(false));
        h.observe(TargetKind::RemoteService, ReachabilityFlags::wifi());
        h.coordinator.step().await;

        assert!(!h.handle.snapshot().authenticated);
        assert_eq!(h.authenticator.calls(), 3);
        assert_eq!(h.presenter.titles(), vec!["Sign in required"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_deferred_while_remote_unreachable() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);
        h.coordinator.step().await;
        assert_eq!(h.authenticator.calls(), 1);

        h.observe(TargetKind::RemoteService, ReachabilityFlags::wifi());
        h.observe(TargetKind::RemoteService, ReachabilityFlags::unreachable());
        h.send(CoordinatorEvent::CheckAuthentication);
        assert!(!h.handle.snapshot().session_check_in_flight);
        assert_eq!(h.authenticator.calls(), 1);

        h.observe(TargetKind::RemoteService, ReachabilityFlags::cellular());
        assert!(h.handle.snapshot().session_check_in_flight);
        h.coordinator.step().await;
        assert_eq!(h.authenticator.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_through_unknown_still_rechecks() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);
        h.coordinator.step().await;
        assert_eq!(h.authenticator.calls(), 1);

        let remote = h.coordinator.notifier(TargetKind::RemoteService);
        remote.notify(Ok(ReachabilityFlags::wifi()));
        remote.notify(Ok(ReachabilityFlags::unreachable()));
        remote.notify(Err(lifeline_reachability::ProbeError::Query(
            "timed out".to_string(),
        )));
        h.coordinator.process_pending();
        assert_eq!(h.handle.snapshot().remote_service, ReachabilityState::Unknown);
        assert!(!h.handle.snapshot().session_check_in_flight);

        h.authenticator.set(Ok(false));
        h.observe(TargetKind::RemoteService, ReachabilityFlags::wifi());
        assert!(h.handle.snapshot().session_check_in_flight);
        h.coordinator.step().await;

        assert_eq!(h.authenticator.calls(), 2);
        assert!(!h.handle.snapshot().authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wipe_clears_session_and_credentials() {
        let mut h = harness();
        h.launch();
        h.send(CoordinatorEvent::EnteredForeground);
        h.coordinator.step().await;
        assert!(h.handle.snapshot().authenticated);

        h.handle.wipe_credentials().unwrap();
        h.coordinator.process_pending();

        assert!(!h.handle.snapshot().authenticated);
        assert!(h.credentials.lookup().is_none());
        let changes = h.bus.events_for(topics::SESSION_CHANGED);
        assert_eq!(changes.last().unwrap().payload["reason"], "cleared");

        // No credentials left: the next check is a definite "no".
        h.send(CoordinatorEvent::CheckAuthentication);
        h.coordinator.step().await;
        assert!(!h.handle.snapshot().authenticated);
        assert_eq!(h.authenticator.calls(), 1);
    }
}

// =============================================================================
// Alert Queue Tests
// =============================================================================

mod alerts {
    use super::*;

    #[tokio::test]
    async fn test_alerts_presented_sequentially_in_order() {
        let mut h = harness();
        h.handle.show_alert("first", "showing").unwrap();
        h.handle.show_alert("one", "1").unwrap();
        h.handle.show_alert("two", "2").unwrap();
        h.handle.show_alert("three", "3").unwrap();
        h.coordinator.process_pending();

        assert_eq!(h.presenter.titles(), vec!["first"]);
        assert_eq!(h.handle.snapshot().alerts_queued, 3);

        for expected in ["one", "two", "three"] {
            h.send(CoordinatorEvent::AlertDismissed);
            assert_eq!(h.presenter.titles().last().map(String::as_str), Some(expected));
        }

        h.send(CoordinatorEvent::AlertDismissed);
        let snapshot = h.handle.snapshot();
        assert!(snapshot.alert.is_none());
        assert_eq!(snapshot.alerts_queued, 0);
        assert_eq!(h.presenter.titles(), vec!["first", "one", "two", "three"]);
        assert_eq!(h.bus.events_for(topics::ALERT_PRESENTED).len(), 4);
    }

    #[tokio::test]
    async fn test_bounded_queue_drops_newest() {
        let mut h = harness_with(CoordinatorConfig {
            poll_interval_ms: 0,
            alerts: lifeline_coordinator::AlertQueueConfig {
                capacity: Some(1),
                overflow: lifeline_coordinator::OverflowPolicy::DropNewest,
            },
            ..Default::default()
        });
        for title in ["a", "b", "c"] {
            h.send(CoordinatorEvent::ShowAlert(Alert::new(title, "")));
        }
        h.send(CoordinatorEvent::AlertDismissed);
        h.send(CoordinatorEvent::AlertDismissed);

        assert_eq!(h.presenter.titles(), vec!["a", "b"]);
    }
}
