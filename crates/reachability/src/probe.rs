//! Probe traits for querying link state.
//!
//! A probe answers "is there a path to this host right now". The monitor
//! turns those answers into de-duplicated state transitions.

use crate::state::ReachabilityFlags;
use async_trait::async_trait;
use std::sync::Mutex;

/// Failure to query the platform for reachability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("reachability query failed: {0}")]
    Query(String),

    #[error("no probe available on this platform")]
    Unsupported,
}

/// Source of raw reachability observations.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Query the path to `host`. `None` asks about general internet access.
    async fn query(&self, host: Option<&str>) -> Result<ReachabilityFlags, ProbeError>;
}

/// Probe for platforms without reachability support. Every query fails,
/// so monitors driven by it stay `Unknown`.
pub struct NullProbe;

#[async_trait]
impl ReachabilityProbe for NullProbe {
    async fn query(&self, _host: Option<&str>) -> Result<ReachabilityFlags, ProbeError> {
        Err(ProbeError::Unsupported)
    }
}

/// Probe that answers with whatever was last set. Handy for simulators and
/// for forcing an offline state from the shell.
#[derive(Default)]
pub struct StaticProbe {
    answer: Mutex<Option<Result<ReachabilityFlags, ProbeError>>>,
}

impl StaticProbe {
    pub fn new(flags: ReachabilityFlags) -> Self {
        Self {
            answer: Mutex::new(Some(Ok(flags))),
        }
    }

    pub fn set(&self, answer: Result<ReachabilityFlags, ProbeError>) {
        if let Ok(mut guard) = self.answer.lock() {
            *guard = Some(answer);
        }
    }
}

#[async_trait]
impl ReachabilityProbe for StaticProbe {
    async fn query(&self, _host: Option<&str>) -> Result<ReachabilityFlags, ProbeError> {
        self.answer
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .unwrap_or(Err(ProbeError::Unsupported))
    }
}
