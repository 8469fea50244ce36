//! Typed messages for the coordinator's serialized event queue.
//!
//! The platform adapter translates lifecycle callbacks into these; monitors
//! and spawned session checks post their results the same way, so every
//! state mutation happens in arrival order on one logical thread.

use crate::alerts::Alert;
use crate::blog::BlogRef;
use lifeline_notifications::{DeliveryContext, DeviceToken};
use lifeline_reachability::ReachabilityChange;
use lifeline_session::CheckOutcome;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    /// Process finished launching. Carries the push payload from the launch
    /// options, if the app was opened from a notification.
    Launched { launch_payload: Option<Value> },
    EnteredForeground,
    EnteredBackground,
    Terminating,
    /// The UI finished initializing and can be navigated.
    UiReady,

    ReachabilityChanged(ReachabilityChange),

    /// Explicit caller request for a session check.
    CheckAuthentication,
    SessionChecked {
        generation: u64,
        outcome: CheckOutcome,
    },

    PushReceived {
        payload: Value,
        context: DeliveryContext,
    },
    DeviceTokenReceived(DeviceToken),
    PushRegistrationFailed(String),

    /// The upload guard changed state (begin, end or forced expiration).
    UploadStatusChanged,

    /// The user selected another blog (already persisted by the blog store).
    ActiveBlogChanged(Option<BlogRef>),

    ShowAlert(Alert),
    AlertDismissed,

    /// Logout: forget credentials and everything derived from them.
    WipeCredentials,
}

impl CoordinatorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CoordinatorEvent::Launched { .. } => "launched",
            CoordinatorEvent::EnteredForeground => "entered_foreground",
            CoordinatorEvent::EnteredBackground => "entered_background",
            CoordinatorEvent::Terminating => "terminating",
            CoordinatorEvent::UiReady => "ui_ready",
            CoordinatorEvent::ReachabilityChanged(_) => "reachability_changed",
            CoordinatorEvent::CheckAuthentication => "check_authentication",
            CoordinatorEvent::SessionChecked { .. } => "session_checked",
            CoordinatorEvent::PushReceived { .. } => "push_received",
            CoordinatorEvent::DeviceTokenReceived(_) => "device_token_received",
            CoordinatorEvent::PushRegistrationFailed(_) => "push_registration_failed",
            CoordinatorEvent::UploadStatusChanged => "upload_status_changed",
            CoordinatorEvent::ActiveBlogChanged(_) => "active_blog_changed",
            CoordinatorEvent::ShowAlert(_) => "show_alert",
            CoordinatorEvent::AlertDismissed => "alert_dismissed",
            CoordinatorEvent::WipeCredentials => "wipe_credentials",
        }
    }
}
