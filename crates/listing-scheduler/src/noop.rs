//! Job manager that accepts every call and does nothing.
//!
//! Used when background execution is switched off. Call sites stay the same;
//! registrations are discarded and every query comes back empty.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{JobCallback, JobManager, JobMetrics, JobStatus, Mode, SchedulerError};

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopJobManager;

impl NoopJobManager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl JobManager for NoopJobManager {
    fn mode(&self) -> Mode {
        Mode::Disabled
    }

    fn schedule_job(
        &self,
        id: &str,
        _name: &str,
        _callback: JobCallback,
        _interval: Duration,
    ) -> Result<(), SchedulerError> {
        debug!(job = %id, "Background jobs disabled, ignoring registration");
        Ok(())
    }

    fn schedule_cron_job(
        &self,
        id: &str,
        _name: &str,
        _callback: JobCallback,
        _cron_expr: &str,
    ) -> Result<(), SchedulerError> {
        debug!(job = %id, "Background jobs disabled, ignoring cron registration");
        Ok(())
    }

    async fn trigger_job(&self, id: &str) -> Result<(), SchedulerError> {
        debug!(job = %id, "Background jobs disabled, ignoring trigger");
        Ok(())
    }

    fn stop_job(&self, _id: &str) -> Option<JobStatus> {
        None
    }

    fn stop_all_jobs(&self) {}

    fn get_job_status(&self, _id: &str) -> Option<JobStatus> {
        None
    }

    fn get_all_job_statuses(&self) -> Vec<JobStatus> {
        Vec::new()
    }

    fn get_job_metrics(&self) -> JobMetrics {
        JobMetrics::default()
    }
}
