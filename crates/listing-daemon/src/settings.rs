//! Configuration loading for the jobs daemon.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/listing-jobs/config.toml.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use listing_scheduler::{SchedulerConfig, SchedulerError};

/// How often a configured job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSchedule {
    Interval(Duration),
    Cron(String),
}

/// One recurring maintenance job from the `[[jobs]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobDefinition {
    /// Stable job id
    pub id: String,

    /// Display name (defaults to the id)
    #[serde(default)]
    pub name: Option<String>,

    /// Fixed interval in milliseconds
    #[serde(default)]
    pub interval_ms: Option<u64>,

    /// Cron expression, translated to an interval
    #[serde(default)]
    pub cron: Option<String>,

    /// Program and arguments to run on every tick
    pub command: Vec<String>,
}

impl JobDefinition {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Validate that the definition names exactly one schedule and a program.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("job id must not be empty".to_string());
        }
        if self.command.first().map_or(true, |program| program.trim().is_empty()) {
            return Err(format!("job {}: command must not be empty", self.id));
        }
        match (self.interval_ms, self.cron.as_deref()) {
            (Some(0), None) => Err(format!("job {}: interval_ms must be > 0", self.id)),
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => Err(format!(
                "job {}: set either interval_ms or cron, not both",
                self.id
            )),
            (None, None) => Err(format!("job {}: interval_ms or cron is required", self.id)),
        }
    }

    /// The schedule, once [`JobDefinition::validate`] has passed.
    pub fn schedule(&self) -> Option<JobSchedule> {
        match (self.interval_ms, &self.cron) {
            (Some(ms), None) => Some(JobSchedule::Interval(Duration::from_millis(ms))),
            (None, Some(expr)) => Some(JobSchedule::Cron(expr.clone())),
            _ => None,
        }
    }
}

/// Main daemon settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between metrics snapshots in the log (0 disables)
    #[serde(default = "default_metrics_log_secs")]
    pub metrics_log_secs: u64,

    /// Job manager tunables
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Recurring jobs registered at startup
    #[serde(default)]
    pub jobs: Vec<JobDefinition>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_log_secs() -> u64 {
    60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_log_secs: default_metrics_log_secs(),
            scheduler: SchedulerConfig::default(),
            jobs: Vec::new(),
        }
    }
}

fn config_err(e: config::ConfigError) -> SchedulerError {
    SchedulerError::Config(e.to_string())
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/listing-jobs/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (LISTING_*, `__` between nested keys)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, SchedulerError> {
        let config_dir = ProjectDirs::from("", "", "listing-jobs")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let default_config_path = config_dir.join("config");

        let scheduler_defaults = SchedulerConfig::default();
        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(config_err)?
            .set_default("metrics_log_secs", default_metrics_log_secs() as i64)
            .map_err(config_err)?
            .set_default(
                "scheduler.shutdown_grace_secs",
                scheduler_defaults.shutdown_grace_secs as i64,
            )
            .map_err(config_err)?
            .set_default(
                "scheduler.default_cron_interval_ms",
                scheduler_defaults.default_cron_interval_ms as i64,
            )
            .map_err(config_err)?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // LISTING_LOG_LEVEL, LISTING_SCHEDULER__SHUTDOWN_GRACE_SECS, ...
        builder = builder.add_source(
            Environment::with_prefix("LISTING")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .map_err(config_err)?
            .try_deserialize()
            .map_err(config_err)?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate scheduler tunables and every job definition.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        self.scheduler.validate()?;

        let mut seen = std::collections::HashSet::new();
        for job in &self.jobs {
            job.validate().map_err(SchedulerError::Config)?;
            if !seen.insert(job.id.as_str()) {
                return Err(SchedulerError::Config(format!(
                    "job {} is defined more than once",
                    job.id
                )));
            }
        }
        Ok(())
    }
}
