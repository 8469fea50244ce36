//! The asynchronous authentication check.

use crate::credentials::{CredentialStore, Credentials};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Why a check could not reach a verdict.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("authentication check timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Verifies credentials against the remote service.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// `Ok(true)` if the credentials are accepted, `Ok(false)` if the
    /// service definitively rejects them.
    async fn verify(&self, credentials: &Credentials) -> Result<bool, CheckError>;
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Authenticated,
    Unauthenticated,
    CheckFailed(CheckError),
}

impl CheckOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CheckOutcome::Authenticated => "authenticated",
            CheckOutcome::Unauthenticated => "unauthenticated",
            CheckOutcome::CheckFailed(_) => "check_failed",
        }
    }
}

/// Handle to a check started with [`SessionState::begin_check`](crate::SessionState::begin_check).
#[derive(Debug, Clone)]
pub struct PendingCheck {
    pub(crate) generation: u64,
    pub(crate) cancel: CancellationToken,
}

impl PendingCheck {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run the check. Returns `None` if a newer check superseded this one
    /// (or the session was cleared) before a verdict arrived.
    pub async fn run(
        self,
        store: Arc<dyn CredentialStore>,
        authenticator: Arc<dyn Authenticator>,
        timeout: Duration,
    ) -> Option<CheckOutcome> {
        let Some(credentials) = store.lookup() else {
            tracing::debug!(generation = self.generation, "no stored credentials");
            return Some(CheckOutcome::Unauthenticated);
        };

        let verdict = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!(generation = self.generation, "authentication check superseded");
                return None;
            }
            verdict = tokio::time::timeout(timeout, authenticator.verify(&credentials)) => verdict,
        };

        let outcome = match verdict {
            Ok(Ok(true)) => CheckOutcome::Authenticated,
            Ok(Ok(false)) => CheckOutcome::Unauthenticated,
            Ok(Err(e)) => CheckOutcome::CheckFailed(e),
            Err(_) => CheckOutcome::CheckFailed(CheckError::Timeout(timeout)),
        };
        tracing::debug!(generation = self.generation, outcome = outcome.label(), "authentication check finished");
        Some(outcome)
    }
}
