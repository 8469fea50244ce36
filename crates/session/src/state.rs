//! Session flag and check bookkeeping.

use crate::check::{CheckOutcome, PendingCheck};
use tokio_util::sync::CancellationToken;

/// What applying a check result did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A newer check was started (or the session cleared) since this one began.
    Stale,
    /// Verdict matched the current flag.
    Unchanged,
    /// The flag flipped to `authenticated`.
    Changed { authenticated: bool },
    /// No verdict; the last known flag is kept and a retry is owed.
    Failed,
}

/// Whether the active account is authenticated against the remote service.
///
/// Owned by the coordinator and only touched from its event loop. Checks run
/// elsewhere and come back through [`apply`](Self::apply); overlapping
/// checks collapse to the most recent one.
#[derive(Debug, Default)]
pub struct SessionState {
    authenticated: bool,
    generation: u64,
    in_flight: Option<CancellationToken>,
    retry_owed: bool,
    last_verdict_ms: Option<i64>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_checking(&self) -> bool {
        self.in_flight.is_some()
    }

    /// A check failed or was deferred and should be retried on the next trigger.
    pub fn retry_owed(&self) -> bool {
        self.retry_owed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the last definitive verdict was applied.
    pub fn last_verdict_ms(&self) -> Option<i64> {
        self.last_verdict_ms
    }

    /// Start a new check, cancelling the one in flight.
    pub fn begin_check(&mut self) -> PendingCheck {
        if let Some(previous) = self.in_flight.take() {
            previous.cancel();
            tracing::debug!(superseded = self.generation, "cancelling in-flight check");
        }
        self.generation += 1;
        self.retry_owed = false;

        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());
        PendingCheck {
            generation: self.generation,
            cancel,
        }
    }

    /// Record that a check was wanted but could not run now.
    pub fn defer(&mut self) {
        self.retry_owed = true;
    }

    /// Apply the result of the check started as `generation`.
    pub fn apply(&mut self, generation: u64, outcome: &CheckOutcome) -> Applied {
        if generation != self.generation {
            tracing::debug!(generation, latest = self.generation, "ignoring stale check result");
            return Applied::Stale;
        }
        self.in_flight = None;

        let verdict = match outcome {
            CheckOutcome::Authenticated => true,
            CheckOutcome::Unauthenticated => false,
            CheckOutcome::CheckFailed(e) => {
                tracing::warn!(error = %e, authenticated = self.authenticated, "session check failed, keeping last known state");
                self.retry_owed = true;
                return Applied::Failed;
            }
        };

        self.last_verdict_ms = Some(chrono::Utc::now().timestamp_millis());
        if verdict == self.authenticated {
            return Applied::Unchanged;
        }
        self.authenticated = verdict;
        tracing::info!(authenticated = verdict, "session state changed");
        Applied::Changed {
            authenticated: verdict,
        }
    }

    /// Forget the session (logout, credential wipe, termination).
    ///
    /// Any in-flight check is cancelled and its result will be stale.
    /// Returns whether the session was authenticated.
    pub fn clear(&mut self) -> bool {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel();
        }
        self.generation += 1;
        self.retry_owed = false;
        self.last_verdict_ms = None;
        std::mem::replace(&mut self.authenticated, false)
    }
}
