//! Application-state coordinator.
//!
//! Composes the connectivity monitors, session state, upload guard and
//! notification router into one view of "is the app usable right now, and
//! what should happen next". The platform adapter owns a [`Coordinator`],
//! hands [`CoordinatorHandle`]s to whoever needs to post events, and drives
//! the queue with [`Coordinator::run`].
//!
//! # Example
//!
//! ```ignore
//! use lifeline_coordinator::{Collaborators, Coordinator, CoordinatorConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let mut coordinator = Coordinator::new(CoordinatorConfig::default(), Collaborators::detached())?;
//! let handle = coordinator.handle();
//! handle.launched(None)?;
//! handle.entered_foreground()?;
//! coordinator.run(CancellationToken::new()).await;
//! ```

mod alerts;
mod blog;
mod collaborators;
mod config;
mod coordinator;
mod error;
mod event;
mod handle;
mod snapshot;

pub use alerts::{Alert, AlertPresenter, AlertQueue, Enqueued};
pub use blog::{BlogRef, BlogStore, InMemoryBlogStore};
pub use collaborators::{
    Collaborators, LoggingAlertPresenter, LoggingDispatcher, RejectingAuthenticator,
};
pub use config::{
    default_config_path, AlertQueueConfig, BackgroundPolicy, ConfigError, CoordinatorConfig,
    OverflowPolicy, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
};
pub use coordinator::Coordinator;
pub use error::CoordinatorError;
pub use event::CoordinatorEvent;
pub use handle::CoordinatorHandle;
pub use snapshot::AppSnapshot;
