//! Scheduler configuration.
//!
//! Provides the tunables shared by every job manager: how long shutdown
//! waits for in-flight executions and the interval used for cron
//! expressions the translation table does not recognise.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SchedulerError;

/// Configuration for the job managers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Seconds to wait for in-flight executions during graceful shutdown.
    /// Defaults to 30 seconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,

    /// Interval in milliseconds assigned to unrecognised cron expressions.
    /// Defaults to 60 000 (one minute).
    #[serde(default = "default_cron_interval")]
    pub default_cron_interval_ms: u64,
}

fn default_shutdown_grace() -> u64 {
    30
}

fn default_cron_interval() -> u64 {
    60_000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: default_shutdown_grace(),
            default_cron_interval_ms: default_cron_interval(),
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Config` if the cron fallback interval is zero.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.default_cron_interval_ms == 0 {
            return Err(SchedulerError::Config(
                "default_cron_interval_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Grace period for shutdown as a `Duration`.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Fallback cron interval as a `Duration`.
    pub fn default_cron_interval(&self) -> Duration {
        Duration::from_millis(self.default_cron_interval_ms)
    }
}
