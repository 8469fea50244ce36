//! Shared event contracts for the lifeline crates.
//!
//! The coordinator and the upload guard describe every observable
//! transition with one of the DTOs below and publish it on an
//! [`EventBus`] under a fixed topic. Subscribers deserialize the same types,
//! so field names cannot drift between producer and consumer.

mod bus;

pub use bus::{
    publish_to, EmittedEvent, EventBus, EventBusRef, InMemoryEventBus, NullEventBus,
    TracingEventBus,
};

use lifeline_reachability::{ReachabilityChange, ReachabilityState, TargetKind};
use serde::{Deserialize, Serialize};

/// Current time in milliseconds since the epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Application lifecycle phase as seen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Process started, launch not handled yet.
    #[default]
    NotLaunched,
    /// Launch handled, not yet in the foreground.
    Launched,
    Foreground,
    Background,
    Terminated,
}

impl LifecyclePhase {
    pub fn label(&self) -> &'static str {
        match self {
            LifecyclePhase::NotLaunched => "not_launched",
            LifecyclePhase::Launched => "launched",
            LifecyclePhase::Foreground => "foreground",
            LifecyclePhase::Background => "background",
            LifecyclePhase::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Producers: coordinator
/// Consumers: UI shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecyclePhaseEvent {
    pub previous: LifecyclePhase,
    pub phase: LifecyclePhase,
    pub timestamp_ms: i64,
}

/// Emitted when a monitor's derived state changes.
///
/// Producers: coordinator (on behalf of the three monitors)
/// Consumers: UI shell, upload subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityChangedEvent {
    pub target: TargetKind,
    #[serde(default)]
    pub host: Option<String>,
    pub previous: ReachabilityState,
    pub current: ReachabilityState,
    pub timestamp_ms: i64,
}

impl From<&ReachabilityChange> for ReachabilityChangedEvent {
    fn from(change: &ReachabilityChange) -> Self {
        Self {
            target: change.kind,
            host: change.host.clone(),
            previous: change.previous,
            current: change.current,
            timestamp_ms: change.timestamp_ms,
        }
    }
}

/// Whether uploads to the current blog should be attempted.
///
/// Producers: coordinator
/// Consumers: upload subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAvailabilityEvent {
    pub allowed: bool,
    pub blog_state: ReachabilityState,
}

/// Emitted when the session flag flips.
///
/// Producers: coordinator
/// Consumers: UI shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionChangedEvent {
    pub authenticated: bool,
    /// Why it changed: `checked` or `cleared`.
    pub reason: String,
    pub timestamp_ms: i64,
}

/// Emitted each time an alert becomes the visible one.
///
/// Producers: coordinator (alert queue)
/// Consumers: UI shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPresentedEvent {
    pub title: String,
    pub message: String,
    /// Alerts still waiting behind this one.
    pub queued: usize,
}

/// Emitted when a push payload is routed to a screen.
///
/// Producers: coordinator (notification router)
/// Consumers: UI shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDispatchedEvent {
    /// Destination label, e.g. `comment` or `fallback`.
    pub destination: String,
    /// Delivery context, e.g. `launch`.
    pub context: String,
    /// Whether the payload waited for UI readiness.
    pub was_deferred: bool,
}

/// Stage of an extended-execution upload window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    Started,
    Finished,
    /// The OS expiration warning forced the release.
    Expired,
}

/// Producers: upload guard
/// Consumers: coordinator, UI shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLifecycleEvent {
    pub ticket: String,
    pub stage: UploadStage,
    pub timestamp_ms: i64,
}

/// Event names as constants to prevent typos.
pub mod topics {
    pub const LIFECYCLE_PHASE: &str = "lifecycle:phase";
    pub const REACHABILITY_CHANGED: &str = "reachability:changed";
    pub const UPLOAD_AVAILABILITY: &str = "uploads:availability";
    pub const UPLOAD_LIFECYCLE: &str = "uploads:lifecycle";
    pub const SESSION_CHANGED: &str = "session:changed";
    pub const ALERT_PRESENTED: &str = "alert:presented";
    pub const NOTIFICATION_DISPATCHED: &str = "push:dispatched";
}
