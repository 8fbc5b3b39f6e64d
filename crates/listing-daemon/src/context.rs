//! Application context: the single owner of the process's job manager.

use std::sync::Arc;

use tracing::info;

use listing_scheduler::{JobManager, ManagerHolder, ModeInputs, SchedulerError};

use crate::jobs::command_callback;
use crate::settings::{JobSchedule, Settings};

/// Everything the daemon shares between startup, the metrics logger and
/// shutdown.
pub struct AppContext {
    settings: Settings,
    holder: ManagerHolder,
}

impl AppContext {
    /// Context whose manager mode comes from the process environment.
    pub fn new(settings: Settings) -> Self {
        let holder = ManagerHolder::from_env(settings.scheduler.clone());
        Self { settings, holder }
    }

    /// Context with explicit mode inputs.
    pub fn with_inputs<F>(settings: Settings, inputs: F) -> Self
    where
        F: Fn() -> ModeInputs + Send + Sync + 'static,
    {
        let holder = ManagerHolder::with_inputs(settings.scheduler.clone(), inputs);
        Self { settings, holder }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The job manager, built on first use.
    pub fn jobs(&self) -> Arc<dyn JobManager> {
        self.holder.get_manager()
    }

    pub fn holder(&self) -> &ManagerHolder {
        &self.holder
    }

    /// Register every job from the settings. Returns how many were registered.
    pub fn register_configured_jobs(&self) -> Result<usize, SchedulerError> {
        let manager = self.jobs();
        for job in &self.settings.jobs {
            job.validate().map_err(SchedulerError::Config)?;
            let callback = command_callback(job.command.clone());
            match job.schedule() {
                Some(JobSchedule::Interval(interval)) => {
                    manager.schedule_job(&job.id, job.display_name(), callback, interval)?
                }
                Some(JobSchedule::Cron(expr)) => {
                    manager.schedule_cron_job(&job.id, job.display_name(), callback, &expr)?
                }
                None => {
                    return Err(SchedulerError::Config(format!(
                        "job {} has no schedule",
                        job.id
                    )))
                }
            }
        }
        info!(
            count = self.settings.jobs.len(),
            mode = ?self.holder.resolved_mode(),
            "Registered configured jobs"
        );
        Ok(self.settings.jobs.len())
    }

    /// Stop all jobs and wait up to the configured grace period.
    pub async fn shutdown(&self) {
        let grace = self.settings.scheduler.shutdown_grace();
        self.jobs().shutdown(grace).await;
    }
}
