//! Single-flight alert queue.

use crate::config::{AlertQueueConfig, OverflowPolicy};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A user-facing modal alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// UI collaborator that shows alerts.
pub trait AlertPresenter: Send + Sync {
    /// Show `alert`. The UI reports dismissal back as an event.
    fn present(&self, alert: &Alert);
}

/// Result of [`AlertQueue::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enqueued {
    /// Nothing was showing; this alert is now visible.
    Presented,
    /// Waiting behind the visible alert at `position` (0 = next).
    Queued { position: usize },
    /// The queue was full and the request was rejected.
    Dropped,
}

/// At most one alert is visible; the rest wait in arrival order.
#[derive(Debug, Default)]
pub struct AlertQueue {
    current: Option<Alert>,
    waiting: VecDeque<Alert>,
    config: AlertQueueConfig,
}

impl AlertQueue {
    pub fn new(config: AlertQueueConfig) -> Self {
        Self {
            current: None,
            waiting: VecDeque::new(),
            config,
        }
    }

    pub fn current(&self) -> Option<&Alert> {
        self.current.as_ref()
    }

    pub fn is_showing(&self) -> bool {
        self.current.is_some()
    }

    pub fn queued_len(&self) -> usize {
        self.waiting.len()
    }

    pub fn request(&mut self, alert: Alert) -> Enqueued {
        if self.current.is_none() {
            self.current = Some(alert);
            return Enqueued::Presented;
        }

        if let Some(capacity) = self.config.capacity {
            if self.waiting.len() >= capacity {
                match self.config.overflow {
                    OverflowPolicy::DropNewest => {
                        tracing::warn!(title = %alert.title, capacity, "alert queue full, dropping new alert");
                        return Enqueued::Dropped;
                    }
                    OverflowPolicy::DropOldest => {
                        if let Some(evicted) = self.waiting.pop_front() {
                            tracing::warn!(title = %evicted.title, capacity, "alert queue full, evicting oldest alert");
                        }
                    }
                }
            }
        }

        self.waiting.push_back(alert);
        Enqueued::Queued {
            position: self.waiting.len() - 1,
        }
    }

    /// The visible alert was dismissed. Returns the next alert to present.
    pub fn dismiss(&mut self) -> Option<&Alert> {
        if self.current.take().is_none() {
            tracing::debug!("dismiss with no alert showing");
        }
        self.current = self.waiting.pop_front();
        self.current.as_ref()
    }

    /// Drop everything, visible alert included.
    pub fn clear(&mut self) {
        self.current = None;
        self.waiting.clear();
    }
}
