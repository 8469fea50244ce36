//! Reachability state and the raw observations it is derived from.

use crate::probe::ProbeError;
use serde::{Deserialize, Serialize};

/// Derived reachability of one monitored target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReachabilityState {
    /// Not observed yet, or the last OS query failed.
    #[default]
    Unknown,
    Unreachable,
    ReachableViaWiFi,
    ReachableViaCellular,
}

impl ReachabilityState {
    /// Fold a raw observation into a state. Query failures become `Unknown`.
    pub fn derive(observation: &Result<ReachabilityFlags, ProbeError>) -> Self {
        match observation {
            Ok(flags) if !flags.reachable => ReachabilityState::Unreachable,
            Ok(flags) if flags.cellular => ReachabilityState::ReachableViaCellular,
            Ok(_) => ReachabilityState::ReachableViaWiFi,
            Err(_) => ReachabilityState::Unknown,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(
            self,
            ReachabilityState::ReachableViaWiFi | ReachabilityState::ReachableViaCellular
        )
    }

    /// Whether an upload attempt may start. `Unknown` is treated as unreachable.
    pub fn allows_uploads(&self) -> bool {
        self.is_reachable()
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReachabilityState::Unknown => "unknown",
            ReachabilityState::Unreachable => "unreachable",
            ReachabilityState::ReachableViaWiFi => "wifi",
            ReachabilityState::ReachableViaCellular => "cellular",
        }
    }
}

impl std::fmt::Display for ReachabilityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw link flags as reported by the platform for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityFlags {
    pub reachable: bool,
    /// Path goes over a cellular (WWAN) interface.
    pub cellular: bool,
}

impl ReachabilityFlags {
    pub fn wifi() -> Self {
        Self {
            reachable: true,
            cellular: false,
        }
    }

    pub fn cellular() -> Self {
        Self {
            reachable: true,
            cellular: true,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            cellular: false,
        }
    }
}

/// Which of the three monitored targets an instance watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// General internet connectivity (no specific host).
    Internet,
    /// The fixed remote service backing accounts.
    RemoteService,
    /// Host of the currently selected blog.
    CurrentBlog,
}

impl TargetKind {
    pub const ALL: [TargetKind; 3] = [
        TargetKind::Internet,
        TargetKind::RemoteService,
        TargetKind::CurrentBlog,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TargetKind::Internet => "internet",
            TargetKind::RemoteService => "remote_service",
            TargetKind::CurrentBlog => "current_blog",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What a monitor is pointed at. `host` is `None` for the general internet route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorTarget {
    pub kind: TargetKind,
    pub host: Option<String>,
}

impl MonitorTarget {
    pub fn internet() -> Self {
        Self {
            kind: TargetKind::Internet,
            host: None,
        }
    }

    pub fn remote_service(host: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::RemoteService,
            host: Some(host.into()),
        }
    }

    pub fn current_blog(host: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::CurrentBlog,
            host: Some(host.into()),
        }
    }
}

/// Emitted by a monitor when its derived state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityChange {
    pub kind: TargetKind,
    pub host: Option<String>,
    pub previous: ReachabilityState,
    pub current: ReachabilityState,
    pub timestamp_ms: i64,
}

impl ReachabilityChange {
    /// Transition out of `Unreachable` into a reachable state.
    pub fn regained(&self) -> bool {
        self.previous == ReachabilityState::Unreachable && self.current.is_reachable()
    }

    /// Transition from a reachable state into `Unreachable`.
    pub fn lost(&self) -> bool {
        self.previous.is_reachable() && self.current == ReachabilityState::Unreachable
    }
}
