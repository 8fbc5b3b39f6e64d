//! Adapter for the hosted scheduling service.
//!
//! Callers see only the `JobManager` contract. Today every call is forwarded
//! to a private `LocalTimerManager`; replacing the forwarding with calls to
//! the remote API changes nothing outside this file.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::{
    HostedSchedulerSettings, JobCallback, JobManager, JobMetrics, JobStatus, LocalTimerManager,
    Mode, SchedulerConfig, SchedulerError,
};

pub struct HostedSchedulerAdapter {
    settings: HostedSchedulerSettings,
    local: LocalTimerManager,
}

impl HostedSchedulerAdapter {
    pub fn new(settings: HostedSchedulerSettings, config: SchedulerConfig) -> Self {
        info!(
            api_url = %settings.api_url,
            "Hosted scheduler configured, delegating to local timers"
        );
        Self {
            settings,
            local: LocalTimerManager::new(config),
        }
    }

    /// Endpoint of the hosted scheduling service.
    pub fn api_url(&self) -> &str {
        &self.settings.api_url
    }
}

#[async_trait]
impl JobManager for HostedSchedulerAdapter {
    fn mode(&self) -> Mode {
        Mode::Hosted
    }

    fn schedule_job(
        &self,
        id: &str,
        name: &str,
        callback: JobCallback,
        interval: Duration,
    ) -> Result<(), SchedulerError> {
        self.local.schedule_job(id, name, callback, interval)
    }

    fn schedule_cron_job(
        &self,
        id: &str,
        name: &str,
        callback: JobCallback,
        cron_expr: &str,
    ) -> Result<(), SchedulerError> {
        self.local.schedule_cron_job(id, name, callback, cron_expr)
    }

    async fn trigger_job(&self, id: &str) -> Result<(), SchedulerError> {
        self.local.trigger_job(id).await
    }

    fn stop_job(&self, id: &str) -> Option<JobStatus> {
        self.local.stop_job(id)
    }

    fn stop_all_jobs(&self) {
        self.local.stop_all_jobs()
    }

    fn get_job_status(&self, id: &str) -> Option<JobStatus> {
        self.local.get_job_status(id)
    }

    fn get_all_job_statuses(&self) -> Vec<JobStatus> {
        self.local.get_all_job_statuses()
    }

    fn get_job_metrics(&self) -> JobMetrics {
        self.local.get_job_metrics()
    }

    async fn shutdown(&self, grace: Duration) {
        self.local.shutdown(grace).await
    }
}
