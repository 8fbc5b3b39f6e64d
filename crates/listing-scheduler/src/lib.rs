//! Background job management for the listing directory.
//!
//! Recurring maintenance work (data sync, cleanup, notification sweeps) runs
//! behind the [`JobManager`] contract. Which implementation sits behind it is
//! decided once per process from the environment:
//!
//! - **disabled**: [`NoopJobManager`], nothing runs
//! - **hosted**: [`HostedSchedulerAdapter`], currently forwarding to local timers
//! - **platform**: platform cron is not wired up, local timers are used
//! - **local**: [`LocalTimerManager`], in-process Tokio timers
//!
//! Guarantees of the local timers:
//!
//! - executions of one job never overlap; a tick that finds the previous run
//!   still in flight is skipped
//! - re-registering an id replaces the previous registration outright
//! - a failing or panicking callback is recorded and retried on the next tick
//!
//! # Example
//!
//! ```ignore
//! use listing_scheduler::{JobCallback, ManagerHolder, SchedulerConfig};
//!
//! let holder = ManagerHolder::from_env(SchedulerConfig::default());
//! let manager = holder.get_manager();
//!
//! manager.schedule_cron_job(
//!     "expired-listings",
//!     "Expire stale listings",
//!     JobCallback::new(|| async { expire_listings().await }),
//!     "*/15 * * * *",
//! )?;
//!
//! // Dashboard
//! let statuses = manager.get_all_job_statuses();
//! let metrics = manager.get_job_metrics();
//! ```

mod config;
pub mod cron;
mod error;
mod factory;
mod hosted;
mod local;
mod manager;
mod mode;
mod noop;
mod overlap;
mod registry;

pub use config::SchedulerConfig;
pub use cron::CronPreset;
pub use error::SchedulerError;
pub use factory::{build_manager, ManagerHolder};
pub use hosted::HostedSchedulerAdapter;
pub use local::LocalTimerManager;
pub use manager::{JobCallback, JobManager};
pub use mode::{
    is_truthy, resolve_mode, resolve_mode_from, HostedSchedulerSettings, Mode, ModeInputs,
};
pub use noop::NoopJobManager;
pub use overlap::{OverlapGuard, RunGuard};
pub use registry::{JobMetrics, JobResult, JobState, JobStatus};
