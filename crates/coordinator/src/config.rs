//! Coordinator configuration.
//!
//! Loaded from `coordinator.json` in the user config directory; every field
//! has a default, so a missing file or a partial one is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name under the platform config dir.
pub const CONFIG_DIR_NAME: &str = "lifeline";

/// File name of the coordinator config.
pub const CONFIG_FILE_NAME: &str = "coordinator.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    Validation(String),
}

/// What to do when a bounded alert queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Reject the incoming alert.
    #[default]
    DropNewest,
    /// Evict the oldest waiting alert to make room.
    DropOldest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AlertQueueConfig {
    /// Maximum alerts waiting behind the visible one. `None` is unbounded.
    pub capacity: Option<usize>,
    pub overflow: OverflowPolicy,
}

/// Which monitors survive a move to the background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundPolicy {
    /// Keep the current-blog monitor running while an upload is in progress.
    pub keep_blog_monitor_for_uploads: bool,
    /// Never stop monitors on backgrounding.
    pub keep_all_monitors: bool,
}

impl Default for BackgroundPolicy {
    fn default() -> Self {
        Self {
            keep_blog_monitor_for_uploads: true,
            keep_all_monitors: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Host of the remote account service.
    pub remote_service_host: String,
    /// Host the HTTP probe uses for general internet access.
    pub internet_probe_host: String,
    /// Probe polling interval. 0 disables polling.
    pub poll_interval_ms: u64,
    pub session_check_timeout_ms: u64,
    /// Show an alert when internet access is lost in the foreground.
    pub alert_on_connection_loss: bool,
    pub alerts: AlertQueueConfig,
    pub background: BackgroundPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            remote_service_host: "wordpress.com".to_string(),
            internet_probe_host: "1.1.1.1".to_string(),
            poll_interval_ms: 5_000,
            session_check_timeout_ms: 15_000,
            alert_on_connection_loss: true,
            alerts: AlertQueueConfig::default(),
            background: BackgroundPolicy::default(),
        }
    }
}

impl CoordinatorConfig {
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_ms > 0).then(|| Duration::from_millis(self.poll_interval_ms))
    }

    pub fn session_check_timeout(&self) -> Duration {
        Duration::from_millis(self.session_check_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote_service_host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "remote_service_host is required".to_string(),
            ));
        }
        if self.session_check_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "session_check_timeout_ms must be positive".to_string(),
            ));
        }
        if self.alerts.capacity == Some(0) {
            return Err(ConfigError::Validation(
                "alerts.capacity must be positive (omit it for an unbounded queue)".to_string(),
            ));
        }
        Ok(())
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: CoordinatorConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }
}

/// Default config location.
///
/// Platform-specific paths:
/// - macOS: ~/Library/Application Support/lifeline/coordinator.json
/// - Linux: ~/.config/lifeline/coordinator.json
/// - Windows: %APPDATA%/lifeline/coordinator.json
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
