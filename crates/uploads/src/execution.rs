//! Background execution port.
//!
//! Mirrors the platform's "begin background task / end background task"
//! pair: a grant buys a finite window after the app leaves the foreground.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Platform identifier of an extended-execution grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantId(pub u64);

impl std::fmt::Display for GrantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "grant-{}", self.0)
    }
}

/// Platform extended-execution service.
pub trait BackgroundExecution: Send + Sync {
    /// Request a grant. `None` means the platform refused.
    fn begin(&self, name: &str) -> Option<GrantId>;

    /// Release a grant. Must be cheap and synchronous.
    fn end(&self, grant: GrantId);
}

/// For platforms without background execution. Every request is refused.
pub struct UnsupportedBackgroundExecution;

impl BackgroundExecution for UnsupportedBackgroundExecution {
    fn begin(&self, _name: &str) -> Option<GrantId> {
        None
    }

    fn end(&self, _grant: GrantId) {}
}

/// Hands out sequential grants and logs them. Used by the headless shell,
/// where the process is never suspended.
#[derive(Default)]
pub struct LoggingBackgroundExecution {
    next: AtomicU64,
}

impl BackgroundExecution for LoggingBackgroundExecution {
    fn begin(&self, name: &str) -> Option<GrantId> {
        let grant = GrantId(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        tracing::info!(name, %grant, "background execution granted");
        Some(grant)
    }

    fn end(&self, grant: GrantId) {
        tracing::info!(%grant, "background execution ended");
    }
}
