//! Push registration port and the device token.

use serde::{Deserialize, Serialize};

/// Device token handed out by the push service, kept as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceToken(String);

impl DeviceToken {
    /// Token from the raw bytes the platform delivers.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let hex = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        Self(hex)
    }

    /// Token from its textual form. Whitespace and `<>` (as printed by some
    /// platforms) are stripped. Returns `None` unless what remains is
    /// non-empty even-length hex.
    pub fn parse(text: &str) -> Option<Self> {
        let hex: String = text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '<' && *c != '>')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let valid = !hex.is_empty() && hex.len() % 2 == 0 && hex.chars().all(|c| c.is_ascii_hexdigit());
        valid.then_some(Self(hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Push registration collaborator (platform + remote service).
pub trait PushRegistrar: Send + Sync {
    /// Ask the platform for a device token. The token (or a failure) comes
    /// back later as a coordinator event.
    fn register(&self);

    /// Tell the remote service to stop sending pushes to `token`.
    fn unregister(&self, token: &DeviceToken);
}

/// Registrar for platforms without push support.
pub struct NullPushRegistrar;

impl PushRegistrar for NullPushRegistrar {
    fn register(&self) {
        tracing::debug!("push registration not supported on this platform");
    }

    fn unregister(&self, _token: &DeviceToken) {}
}
