//! Active blog reference and the store that persists the selection.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// The currently selected blog, as far as the coordinator cares.
///
/// A copy of the selection, not the blog itself: the store owns the
/// selection's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogRef {
    pub id: u64,
    pub url: String,
}

impl BlogRef {
    pub fn new(id: u64, url: impl Into<String>) -> Self {
        Self { id, url: url.into() }
    }

    /// Host part of the blog URL (no scheme, credentials, port or path).
    pub fn host(&self) -> Option<String> {
        let rest = self
            .url
            .split_once("://")
            .map_or(self.url.as_str(), |(_, rest)| rest);
        let authority = rest.split(|c: char| c == '/' || c == '?' || c == '#').next().unwrap_or_default();
        let host_port = authority.rsplit('@').next().unwrap_or_default();
        let host = host_port.split(':').next().unwrap_or_default();

        (!host.is_empty()).then(|| host.to_ascii_lowercase())
    }
}

/// External "current blog" store.
pub trait BlogStore: Send + Sync {
    /// Restore the persisted selection.
    fn current(&self) -> Option<BlogRef>;

    /// Forget the selection (credential wipe).
    fn clear(&self);
}

/// Volatile store for tests and the headless shell.
#[derive(Default)]
pub struct InMemoryBlogStore {
    selected: Mutex<Option<BlogRef>>,
}

impl InMemoryBlogStore {
    pub fn new(selected: Option<BlogRef>) -> Self {
        Self {
            selected: Mutex::new(selected),
        }
    }

    pub fn select(&self, blog: Option<BlogRef>) {
        if let Ok(mut guard) = self.selected.lock() {
            *guard = blog;
        }
    }
}

impl BlogStore for InMemoryBlogStore {
    fn current(&self) -> Option<BlogRef> {
        self.selected.lock().ok().and_then(|guard| guard.clone())
    }

    fn clear(&self) {
        self.select(None);
    }
}
