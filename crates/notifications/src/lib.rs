//! Inbound push notification handling.
//!
//! Payloads can arrive before the UI exists (launch options) or while it is
//! busy initializing. [`NotificationRouter`] dispatches them straight away
//! when the UI is ready and otherwise keeps the most recent one until
//! [`NotificationRouter::flush_pending`] runs.

mod payload;
mod registration;
mod router;

pub use payload::{DeliveryContext, Destination, PayloadError};
pub use registration::{DeviceToken, NullPushRegistrar, PushRegistrar};
pub use router::{Dispatcher, NotificationRouter, PendingNotification, ReceiveOutcome};
