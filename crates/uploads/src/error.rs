//! Error types for the upload guard.

use crate::guard::TicketId;
use thiserror::Error;

/// Misuse of the upload guard. These are caller bugs, never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The single extended-execution slot is taken.
    #[error("an upload is already in progress (ticket {active})")]
    AlreadyInProgress { active: TicketId },
}
