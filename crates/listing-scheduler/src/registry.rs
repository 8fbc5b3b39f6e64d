//! Job status records and process-wide execution metrics.
//!
//! A `JobStatus` exists for exactly as long as its job is registered with a
//! manager. `JobMetrics` aggregates every execution a manager has performed
//! and is handed out as a snapshot copy.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a single job execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobResult {
    /// Callback returned `Ok`
    Success,
    /// Callback returned an error or panicked
    Failed(String),
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        matches!(self, JobResult::Success)
    }
}

/// Lifecycle state of a registered job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Registered and waiting for its next tick
    Scheduled,
    /// An execution is in flight
    Running,
    /// The most recent execution succeeded
    Completed,
    /// The most recent execution failed; the job stays scheduled
    Failed,
    /// Cancelled; reported on the final snapshot returned by `stop_job`
    Stopped,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Scheduled => "scheduled",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Status of a registered job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// Caller-chosen identity of the job
    pub id: String,
    /// Human label, display only
    pub name: String,
    /// Current lifecycle state
    pub status: JobState,
    /// When the timer last started an execution (if ever)
    pub last_run: Option<DateTime<Utc>>,
    /// When the timer is next expected to fire
    pub next_run: DateTime<Utc>,
    /// Duration of the most recent execution in milliseconds
    #[serde(rename = "duration")]
    pub duration_ms: Option<u64>,
    /// Error message, present only while `status` is `Failed`
    pub error: Option<String>,
    /// Effective interval between ticks in milliseconds
    pub interval_ms: u64,
}

impl JobStatus {
    /// Create the status for a freshly registered job.
    ///
    /// `next_run` starts at `registered_at + interval`.
    pub fn new(id: &str, name: &str, interval: Duration, registered_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            status: JobState::Scheduled,
            last_run: None,
            next_run: offset(registered_at, interval),
            duration_ms: None,
            error: None,
            interval_ms: interval.as_millis().try_into().unwrap_or(u64::MAX),
        }
    }

    /// Record that a timer tick started an execution.
    pub fn record_tick_start(&mut self, started_at: DateTime<Utc>) {
        self.status = JobState::Running;
        self.error = None;
        self.last_run = Some(started_at);
    }

    /// Record that a manual trigger started an execution.
    ///
    /// The timer schedule (`last_run`, `next_run`) is left untouched.
    pub fn record_trigger_start(&mut self) {
        self.status = JobState::Running;
        self.error = None;
    }

    /// Record the outcome of an execution.
    pub fn record_complete(&mut self, result: &JobResult, duration_ms: u64) {
        self.duration_ms = Some(duration_ms);
        match result {
            JobResult::Success => {
                self.status = JobState::Completed;
                self.error = None;
            }
            JobResult::Failed(message) => {
                self.status = JobState::Failed;
                self.error = Some(message.clone());
            }
        }
    }

    /// Advance `next_run` to one interval after the last timer run.
    ///
    /// Applied identically after success and failure.
    pub fn advance_next_run(&mut self, interval: Duration) {
        if let Some(last_run) = self.last_run {
            self.next_run = offset(last_run, interval);
        }
    }

    /// Mark the job as cancelled.
    pub fn mark_stopped(&mut self) {
        self.status = JobState::Stopped;
        self.error = None;
    }

    /// Whether an execution is currently in flight.
    pub fn is_running(&self) -> bool {
        self.status == JobState::Running
    }
}

fn offset(at: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(interval)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Aggregate execution metrics for one manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobMetrics {
    /// Executions finished, successful or not
    pub total_executions: u64,
    /// Executions whose callback returned `Ok`
    pub successful_jobs: u64,
    /// Executions whose callback failed
    pub failed_jobs: u64,
    /// Running mean of execution durations in milliseconds;
    /// `None` until the first execution finishes
    pub average_job_duration: Option<f64>,
    /// When `stop_all_jobs` last swept the manager
    pub last_cleanup: Option<DateTime<Utc>>,
}

impl JobMetrics {
    /// Fold one finished execution into the counters and the running mean.
    ///
    /// On the Nth execution: `avg_N = (avg_{N-1} * (N-1) + d_N) / N`.
    pub fn record(&mut self, result: &JobResult, duration_ms: u64) {
        self.total_executions += 1;
        if result.is_success() {
            self.successful_jobs += 1;
        } else {
            self.failed_jobs += 1;
        }

        let n = self.total_executions as f64;
        let sample = duration_ms as f64;
        self.average_job_duration = Some(match self.average_job_duration {
            Some(avg) if self.total_executions > 1 => (avg * (n - 1.0) + sample) / n,
            _ => sample,
        });
    }

    /// Stamp the time of the most recent sweep.
    pub fn record_cleanup(&mut self, at: DateTime<Utc>) {
        self.last_cleanup = Some(at);
    }
}
