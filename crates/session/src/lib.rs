//! Authenticated-session state for the active account.
//!
//! [`SessionState`] holds the flag and decides which check result counts.
//! [`PendingCheck::run`] performs the check itself against an
//! [`Authenticator`], reading credentials from a [`CredentialStore`]. The two
//! halves are split so the flag is only mutated on the coordinator's event
//! loop while the network round trip happens on a spawned task.

mod check;
mod credentials;
mod state;

pub use check::{Authenticator, CheckError, CheckOutcome, PendingCheck};
pub use credentials::{CredentialStore, Credentials, InMemoryCredentialStore};
pub use state::{Applied, SessionState};
