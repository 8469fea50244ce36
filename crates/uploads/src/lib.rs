//! Upload lifecycle guard.
//!
//! Keeps at most one upload inside an extended-execution grant so it can
//! finish after the app is backgrounded, and releases that grant on time
//! when the platform warns it is about to expire.
//!
//! # Example
//!
//! ```ignore
//! use lifeline_uploads::{UploadGuard, UnsupportedBackgroundExecution};
//! use std::sync::Arc;
//!
//! let guard = Arc::new(UploadGuard::new(Arc::new(UnsupportedBackgroundExecution)));
//! let ticket = guard.begin_upload()?;
//! // ... upload ...
//! guard.end_upload(&ticket);
//! ```

mod error;
mod execution;
mod guard;

pub use error::UploadError;
pub use execution::{
    BackgroundExecution, GrantId, LoggingBackgroundExecution, UnsupportedBackgroundExecution,
};
pub use guard::{GuardStatus, TicketId, UploadGuard, UploadTicket, GRANT_NAME};
