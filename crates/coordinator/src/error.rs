//! Error types for the coordinator handle.

use lifeline_uploads::UploadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The coordinator was dropped; its event queue no longer accepts events.
    #[error("coordinator is no longer running")]
    Closed,

    #[error(transparent)]
    Upload(#[from] UploadError),
}
