//! In-process job manager driven by Tokio timers.
//!
//! Every registered job owns one ticker task. A tick claims the job's
//! overlap guard, flips the status to `running`, and hands the callback to a
//! tracked task; when the callback returns, the outcome is written back to
//! the status and folded into the metrics. Ticks that find the guard held
//! are dropped, never queued.
//!
//! Registrations carry a generation number. An execution that finishes after
//! its registration was stopped or replaced finds no matching entry and
//! leaves no trace.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::cron;
use crate::overlap::{OverlapGuard, RunGuard};
use crate::{
    JobCallback, JobManager, JobMetrics, JobResult, JobStatus, Mode, SchedulerConfig,
    SchedulerError,
};

/// What started an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Tick,
    Manual,
}

struct RegisteredJob {
    generation: u64,
    callback: JobCallback,
    interval: Duration,
    status: JobStatus,
    guard: OverlapGuard,
    timer: CancellationToken,
}

/// An execution that has claimed its job's guard.
struct Execution {
    id: String,
    generation: u64,
    trigger: Trigger,
    callback: JobCallback,
    started: Instant,
    _run: RunGuard,
}

struct Shared {
    config: SchedulerConfig,
    jobs: Mutex<HashMap<String, RegisteredJob>>,
    metrics: Mutex<JobMetrics>,
    tracker: TaskTracker,
    next_generation: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis().try_into().unwrap_or(u64::MAX)
}

impl Shared {
    /// Claim the job for one execution and mark it running.
    ///
    /// `generation` pins the lookup to one registration; `None` accepts
    /// whichever registration is current.
    fn begin(
        &self,
        id: &str,
        generation: Option<u64>,
        trigger: Trigger,
    ) -> Result<Execution, SchedulerError> {
        let mut jobs = lock(&self.jobs);
        let job = jobs
            .get_mut(id)
            .filter(|job| generation.map_or(true, |g| g == job.generation))
            .ok_or_else(|| SchedulerError::JobNotFound(id.to_string()))?;

        let run = job
            .guard
            .try_acquire()
            .ok_or_else(|| SchedulerError::AlreadyRunning(id.to_string()))?;

        match trigger {
            Trigger::Tick => job.status.record_tick_start(Utc::now()),
            Trigger::Manual => job.status.record_trigger_start(),
        }

        Ok(Execution {
            id: id.to_string(),
            generation: job.generation,
            trigger,
            callback: job.callback.clone(),
            started: Instant::now(),
            _run: run,
        })
    }

    /// Write an execution's outcome back to its status and the metrics.
    ///
    /// The guard held by `execution` is released only after the status has
    /// left `running`.
    fn finish(&self, execution: Execution, result: &JobResult) {
        let duration_ms = millis(execution.started.elapsed());

        let mut jobs = lock(&self.jobs);
        let Some(job) = jobs
            .get_mut(&execution.id)
            .filter(|job| job.generation == execution.generation)
        else {
            debug!(job = %execution.id, "Execution finished after its job was stopped");
            return;
        };

        job.status.record_complete(result, duration_ms);
        if execution.trigger == Trigger::Tick {
            job.status.advance_next_run(job.interval);
        }
        lock(&self.metrics).record(result, duration_ms);
        drop(jobs);

        match result {
            JobResult::Success => info!(
                job = %execution.id,
                duration_ms,
                trigger = ?execution.trigger,
                "Job completed"
            ),
            JobResult::Failed(message) => warn!(
                job = %execution.id,
                duration_ms,
                trigger = ?execution.trigger,
                error = %message,
                "Job failed"
            ),
        }
    }

    /// Run one execution to completion on the task tracker.
    fn spawn_execution(
        self: &Arc<Self>,
        execution: Execution,
    ) -> tokio::task::JoinHandle<JobResult> {
        let shared = Arc::clone(self);
        self.tracker.spawn(async move {
            let result = execution.callback.invoke().await;
            shared.finish(execution, &result);
            result
        })
    }

    fn on_tick(self: &Arc<Self>, id: &str, generation: u64) {
        match self.begin(id, Some(generation), Trigger::Tick) {
            Ok(execution) => {
                debug!(job = %id, "Job started");
                self.spawn_execution(execution);
            }
            Err(SchedulerError::AlreadyRunning(_)) => {
                debug!(job = %id, "Previous execution still running, skipping tick");
            }
            Err(_) => {}
        }
    }
}

async fn run_ticker(
    shared: Weak<Shared>,
    id: String,
    generation: u64,
    first_tick: Instant,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(first_tick, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else { break };
                shared.on_tick(&id, generation);
            }
        }
    }
}

/// Job manager that runs callbacks on in-process repeating timers.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use listing_scheduler::{JobCallback, JobManager, LocalTimerManager, SchedulerConfig};
///
/// # async fn run() -> Result<(), listing_scheduler::SchedulerError> {
/// let manager = LocalTimerManager::new(SchedulerConfig::default());
/// manager.schedule_job(
///     "listing-sync",
///     "Listing sync",
///     JobCallback::new(|| async { Ok::<_, String>(()) }),
///     Duration::from_secs(300),
/// )?;
///
/// let status = manager.get_job_status("listing-sync");
/// assert!(status.is_some());
/// # Ok(())
/// # }
/// ```
pub struct LocalTimerManager {
    shared: Arc<Shared>,
}

impl LocalTimerManager {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                jobs: Mutex::new(HashMap::new()),
                metrics: Mutex::new(JobMetrics::default()),
                tracker: TaskTracker::new(),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    /// Number of registered jobs.
    pub fn job_count(&self) -> usize {
        lock(&self.shared.jobs).len()
    }

    /// Executions currently in flight, ticks and manual triggers alike.
    pub fn in_flight(&self) -> usize {
        self.shared.tracker.len()
    }
}

impl Default for LocalTimerManager {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Drop for LocalTimerManager {
    fn drop(&mut self) {
        for job in lock(&self.shared.jobs).values() {
            job.timer.cancel();
        }
    }
}

#[async_trait]
impl JobManager for LocalTimerManager {
    fn mode(&self) -> Mode {
        Mode::Local
    }

    fn schedule_job(
        &self,
        id: &str,
        name: &str,
        callback: JobCallback,
        interval: Duration,
    ) -> Result<(), SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval(id.to_string()));
        }
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed);
        let timer = CancellationToken::new();
        let first_tick = Instant::now() + interval;

        let mut jobs = lock(&self.shared.jobs);
        // Replace, never merge: the old timer dies before the new one exists.
        let guard = match jobs.remove(id) {
            Some(previous) => {
                previous.timer.cancel();
                debug!(job = %id, "Replacing existing registration");
                previous.guard
            }
            None => OverlapGuard::new(),
        };

        jobs.insert(
            id.to_string(),
            RegisteredJob {
                generation,
                callback,
                interval,
                status: JobStatus::new(id, name, interval, Utc::now()),
                guard,
                timer: timer.clone(),
            },
        );
        drop(jobs);

        runtime.spawn(run_ticker(
            Arc::downgrade(&self.shared),
            id.to_string(),
            generation,
            first_tick,
            interval,
            timer,
        ));

        info!(job = %id, job_name = %name, interval_ms = millis(interval), "Job registered");
        Ok(())
    }

    fn schedule_cron_job(
        &self,
        id: &str,
        name: &str,
        callback: JobCallback,
        cron_expr: &str,
    ) -> Result<(), SchedulerError> {
        let interval = cron::interval_or(cron_expr, self.shared.config.default_cron_interval());
        debug!(
            job = %id,
            cron = %cron_expr,
            interval_ms = millis(interval),
            "Translated cron expression"
        );
        self.schedule_job(id, name, callback, interval)
    }

    async fn trigger_job(&self, id: &str) -> Result<(), SchedulerError> {
        let execution = self.shared.begin(id, None, Trigger::Manual)?;
        info!(job = %id, "Job triggered manually");

        // Runs on the tracker so a dropped caller cannot strand the status in `running`.
        let result = self
            .shared
            .spawn_execution(execution)
            .await
            .unwrap_or_else(|e| JobResult::Failed(e.to_string()));

        match result {
            JobResult::Success => Ok(()),
            JobResult::Failed(message) => Err(SchedulerError::JobFailed {
                id: id.to_string(),
                message,
            }),
        }
    }

    fn stop_job(&self, id: &str) -> Option<JobStatus> {
        let mut job = lock(&self.shared.jobs).remove(id)?;
        job.timer.cancel();
        job.status.mark_stopped();
        info!(job = %id, "Job stopped");
        Some(job.status)
    }

    fn stop_all_jobs(&self) {
        let stopped: Vec<RegisteredJob> = lock(&self.shared.jobs)
            .drain()
            .map(|(_, job)| job)
            .collect();
        for job in &stopped {
            job.timer.cancel();
        }
        lock(&self.shared.metrics).record_cleanup(Utc::now());
        info!(count = stopped.len(), "Stopped all jobs");
    }

    fn get_job_status(&self, id: &str) -> Option<JobStatus> {
        lock(&self.shared.jobs).get(id).map(|job| job.status.clone())
    }

    fn get_all_job_statuses(&self) -> Vec<JobStatus> {
        lock(&self.shared.jobs)
            .values()
            .map(|job| job.status.clone())
            .collect()
    }

    fn get_job_metrics(&self) -> JobMetrics {
        lock(&self.shared.metrics).clone()
    }

    async fn shutdown(&self, grace: Duration) {
        self.stop_all_jobs();

        let tracker = &self.shared.tracker;
        tracker.close();
        if tokio::time::timeout(grace, tracker.wait()).await.is_err() {
            warn!(
                in_flight = tracker.len(),
                grace_secs = grace.as_secs(),
                "Shutdown grace period elapsed with executions still running"
            );
        }
        tracker.reopen();
        info!("Local timer manager shut down");
    }
}
