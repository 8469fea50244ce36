//! Read-only view of coordinator state, published after every event.

use crate::alerts::Alert;
use crate::blog::BlogRef;
use lifeline_events::LifecyclePhase;
use lifeline_notifications::PendingNotification;
use lifeline_reachability::ReachabilityState;
use lifeline_uploads::GuardStatus;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSnapshot {
    pub phase: LifecyclePhase,
    pub internet: ReachabilityState,
    pub remote_service: ReachabilityState,
    pub current_blog: ReachabilityState,
    pub authenticated: bool,
    pub session_check_in_flight: bool,
    pub uploads: GuardStatus,
    /// Uploads to the current blog should be attempted. Unknown counts as
    /// unreachable.
    pub uploads_allowed: bool,
    pub ui_ready: bool,
    pub alert: Option<Alert>,
    pub alerts_queued: usize,
    pub pending_notification: Option<PendingNotification>,
    pub active_blog: Option<BlogRef>,
}

impl Default for AppSnapshot {
    fn default() -> Self {
        Self {
            phase: LifecyclePhase::NotLaunched,
            internet: ReachabilityState::Unknown,
            remote_service: ReachabilityState::Unknown,
            current_blog: ReachabilityState::Unknown,
            authenticated: false,
            session_check_in_flight: false,
            uploads: GuardStatus::Idle,
            uploads_allowed: false,
            ui_ready: false,
            alert: None,
            alerts_queued: 0,
            pending_notification: None,
            active_blog: None,
        }
    }
}

impl AppSnapshot {
    /// Foreground, online and signed in.
    pub fn is_usable(&self) -> bool {
        self.phase == LifecyclePhase::Foreground
            && self.internet.is_reachable()
            && self.remote_service.is_reachable()
            && self.authenticated
    }
}
