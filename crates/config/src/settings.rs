//! Typed configuration tree
//!
//! Every section carries serde defaults, so an empty source yields a complete,
//! valid configuration.

use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use common::error::{Error, Result};

/// Root of the configuration tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub facade: FacadeSettings,
    pub lifecycle: LifecycleSettings,
    pub health_monitor: HealthMonitorSettings,
    pub feedback_router: FeedbackRouterSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Rejects values that would make the framework unusable
    pub fn validate(&self) -> Result<()> {
        if self.facade.max_depth == 0 {
            return Err(Error::Config("facade.max_depth must be at least 1".to_string()));
        }
        if self.facade.dispatch_timeout_ms == Some(0) {
            return Err(Error::Config("facade.dispatch_timeout_ms must be positive".to_string()));
        }
        if self.lifecycle.cleanup_timeout_ms == 0 || self.lifecycle.abort_grace_ms == 0 {
            return Err(Error::Config("lifecycle timeouts must be positive".to_string()));
        }
        if self.health_monitor.interval_ms == 0 || self.health_monitor.probe_timeout_ms == 0 {
            return Err(Error::Config(
                "health_monitor interval and probe timeout must be positive".to_string(),
            ));
        }
        let router = &self.feedback_router;
        if router.drain_interval_ms == 0 || router.max_queue_depth == 0 || router.batch_size == 0 {
            return Err(Error::Config(
                "feedback_router drain interval, queue depth and batch size must be positive"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Facade dispatch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacadeSettings {
    /// Depth above which a dispatch is treated as runaway recursion
    pub max_depth: u32,
    /// Default bound for bounded dispatch, unbounded when absent
    pub dispatch_timeout_ms: Option<u64>,
}

impl Default for FacadeSettings {
    fn default() -> Self {
        Self {
            max_depth: 32,
            dispatch_timeout_ms: None,
        }
    }
}

impl FacadeSettings {
    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout_ms.map(Duration::from_millis)
    }
}

/// Background-task teardown settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleSettings {
    pub cleanup_timeout_ms: u64,
    pub abort_grace_ms: u64,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            cleanup_timeout_ms: 5_000,
            abort_grace_ms: 500,
        }
    }
}

impl LifecycleSettings {
    pub fn cleanup_timeout(&self) -> Duration {
        Duration::from_millis(self.cleanup_timeout_ms)
    }

    pub fn abort_grace(&self) -> Duration {
        Duration::from_millis(self.abort_grace_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthMonitorSettings {
    pub interval_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for HealthMonitorSettings {
    fn default() -> Self {
        Self {
            interval_ms: 60_000,
            probe_timeout_ms: 2_000,
        }
    }
}

impl HealthMonitorSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackRouterSettings {
    pub drain_interval_ms: u64,
    /// Per-component bound; submissions beyond it are rejected
    pub max_queue_depth: usize,
    /// Signals drained per component per cycle
    pub batch_size: usize,
}

impl Default for FeedbackRouterSettings {
    fn default() -> Self {
        Self {
            drain_interval_ms: 1_000,
            max_queue_depth: 1_000,
            batch_size: 50,
        }
    }
}

impl FeedbackRouterSettings {
    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub format: LogFormat,
    /// Directory for a daily rolling log file, stdout only when absent
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
            file_prefix: "orchestration.log".to_string(),
        }
    }
}
