//! Credential store port.
//!
//! How credentials are kept (keychain, secret service) is up to the
//! platform; the session only needs a lookup and a full wipe.

use std::sync::Mutex;

/// Stored credentials for the remote service account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Platform credential storage.
pub trait CredentialStore: Send + Sync {
    /// Credentials for the remote service account, if any are stored.
    fn lookup(&self) -> Option<Credentials>;

    /// Remove every stored item (logout, credential wipe).
    fn wipe_all(&self);
}

/// Volatile store for tests and the headless shell.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: Mutex<Option<Credentials>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(Some(credentials)),
        }
    }

    pub fn store(&self, credentials: Credentials) {
        if let Ok(mut guard) = self.credentials.lock() {
            *guard = Some(credentials);
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn lookup(&self) -> Option<Credentials> {
        self.credentials.lock().ok().and_then(|guard| guard.clone())
    }

    fn wipe_all(&self) {
        if let Ok(mut guard) = self.credentials.lock() {
            *guard = None;
        }
        tracing::info!("credentials wiped");
    }
}
