//! Network reachability monitoring.
//!
//! Three independent monitors watch general internet access, the remote
//! account service and the host of the currently selected blog. Each folds
//! raw platform observations into a [`ReachabilityState`] and reports only
//! real transitions.
//!
//! # Example
//!
//! ```ignore
//! use lifeline_reachability::{MonitorTarget, ReachabilityMonitor, TargetKind, HttpProbe};
//! use std::sync::Arc;
//!
//! let mut monitor = ReachabilityMonitor::new(TargetKind::RemoteService);
//! monitor.start(MonitorTarget::remote_service("wordpress.com"), Arc::new(|change| {
//!     println!("{} -> {}", change.previous, change.current);
//! }));
//! monitor.spawn_polling(Arc::new(HttpProbe::new("1.1.1.1")?), Duration::from_secs(5));
//! ```

mod http;
mod monitor;
mod probe;
mod state;

pub use http::{HttpProbe, DEFAULT_PROBE_TIMEOUT};
pub use monitor::{ReachabilityCallback, ReachabilityMonitor, ReachabilityNotifier};
pub use probe::{NullProbe, ProbeError, ReachabilityProbe, StaticProbe};
pub use state::{
    MonitorTarget, ReachabilityChange, ReachabilityFlags, ReachabilityState, TargetKind,
};
