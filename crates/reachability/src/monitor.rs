//! Connectivity monitor - one instance per watched target.
//!
//! Raw observations arrive either from the platform (through a
//! [`ReachabilityNotifier`]) or from a polling task driven by a
//! [`ReachabilityProbe`]. The monitor folds them into a [`ReachabilityState`]
//! and invokes its callback only when that state actually changes.

use crate::probe::{ProbeError, ReachabilityProbe};
use crate::state::{
    MonitorTarget, ReachabilityChange, ReachabilityFlags, ReachabilityState, TargetKind,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Callback type for reachability transitions.
pub type ReachabilityCallback = Arc<dyn Fn(ReachabilityChange) + Send + Sync + 'static>;

struct MonitorInner {
    kind: TargetKind,
    host: Option<String>,
    state: ReachabilityState,
    running: bool,
    callback: Option<ReachabilityCallback>,
}

impl MonitorInner {
    /// Move to `next` and hand the change to the callback.
    ///
    /// Runs with the monitor lock held so concurrent notifiers deliver their
    /// changes in the order the state actually moved. The callback must not
    /// call back into this monitor.
    fn transition(&mut self, next: ReachabilityState) -> Option<ReachabilityChange> {
        if next == self.state {
            return None;
        }
        let change = ReachabilityChange {
            kind: self.kind,
            host: self.host.clone(),
            previous: self.state,
            current: next,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        };
        self.state = next;

        tracing::debug!(
            target_kind = %change.kind,
            host = ?change.host,
            previous = %change.previous,
            current = %change.current,
            "reachability changed"
        );
        if let Some(callback) = &self.callback {
            callback(change.clone());
        }
        Some(change)
    }
}

fn lock(inner: &Mutex<MonitorInner>) -> MutexGuard<'_, MonitorInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Entry point for raw link-state notifications.
///
/// Cloneable and cheap; hand one to the platform callback. Notifications
/// that arrive while the monitor is stopped are ignored.
#[derive(Clone)]
pub struct ReachabilityNotifier {
    inner: Arc<Mutex<MonitorInner>>,
}

impl ReachabilityNotifier {
    /// Feed one raw observation. Returns the emitted change, if any.
    pub fn notify(
        &self,
        observation: Result<ReachabilityFlags, ProbeError>,
    ) -> Option<ReachabilityChange> {
        let next = ReachabilityState::derive(&observation);

        let mut inner = lock(&self.inner);
        if !inner.running {
            tracing::trace!(target_kind = %inner.kind, "observation while stopped, ignoring");
            return None;
        }
        if let Err(e) = &observation {
            tracing::debug!(target_kind = %inner.kind, error = %e, "reachability query failed");
        }
        inner.transition(next)
    }

    fn host(&self) -> Option<String> {
        lock(&self.inner).host.clone()
    }
}

/// Watches a single target and reports derived-state transitions.
pub struct ReachabilityMonitor {
    inner: Arc<Mutex<MonitorInner>>,
    polling: Option<CancellationToken>,
}

impl ReachabilityMonitor {
    pub fn new(kind: TargetKind) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MonitorInner {
                kind,
                host: None,
                state: ReachabilityState::Unknown,
                running: false,
                callback: None,
            })),
            polling: None,
        }
    }

    pub fn kind(&self) -> TargetKind {
        lock(&self.inner).kind
    }

    pub fn host(&self) -> Option<String> {
        lock(&self.inner).host.clone()
    }

    pub fn current_state(&self) -> ReachabilityState {
        lock(&self.inner).state
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner).running
    }

    pub fn notifier(&self) -> ReachabilityNotifier {
        ReachabilityNotifier {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Begin observing `target`.
    ///
    /// Starting an already running monitor on the same host is a no-op and
    /// returns `false`. Pointing it at a different host re-derives the state
    /// from scratch: it drops back to `Unknown`, reported as a change when the
    /// previous state was anything else.
    pub fn start(&mut self, target: MonitorTarget, callback: ReachabilityCallback) -> bool {
        let mut inner = lock(&self.inner);
        if target.kind != inner.kind {
            tracing::warn!(
                monitor = %inner.kind,
                requested = %target.kind,
                "refusing to start monitor on a target of another kind"
            );
            return false;
        }
        if inner.running && inner.host == target.host {
            tracing::debug!(target_kind = %inner.kind, host = ?inner.host, "monitor already started");
            return false;
        }

        inner.callback = Some(callback);
        inner.running = true;
        if inner.host != target.host {
            inner.host = target.host;
            inner.transition(ReachabilityState::Unknown);
        }
        tracing::info!(target_kind = %inner.kind, host = ?inner.host, "monitor started");
        true
    }

    /// Stop observing. The last derived state is kept.
    pub fn stop(&mut self) {
        if let Some(token) = self.polling.take() {
            token.cancel();
        }

        let mut inner = lock(&self.inner);
        if inner.running {
            tracing::info!(target_kind = %inner.kind, "monitor stopped");
        }
        inner.running = false;
        inner.callback = None;
    }

    /// Drive this monitor from `probe` every `interval` on the current tokio
    /// runtime. Cancelled by [`stop`](Self::stop). Returns `false` when the
    /// monitor is stopped, already polling, or no runtime is available.
    pub fn spawn_polling(&mut self, probe: Arc<dyn ReachabilityProbe>, interval: Duration) -> bool {
        if !self.is_running() || interval.is_zero() {
            return false;
        }
        if self.polling.as_ref().is_some_and(|t| !t.is_cancelled()) {
            return false;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(target_kind = %self.kind(), "no tokio runtime, reachability polling disabled");
            return false;
        };

        let token = CancellationToken::new();
        let cancelled = token.child_token();
        let notifier = self.notifier();
        let kind = self.kind();

        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let host = notifier.host();
                let observation = tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    observation = probe.query(host.as_deref()) => observation,
                };
                notifier.notify(observation);
            }

            tracing::debug!(target_kind = %kind, "reachability polling stopped");
        });

        self.polling = Some(token);
        true
    }
}

impl Drop for ReachabilityMonitor {
    fn drop(&mut self) {
        if let Some(token) = self.polling.take() {
            token.cancel();
        }
    }
}
