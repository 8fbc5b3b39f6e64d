//! The job manager contract shared by every implementation.
//!
//! Callers hold an `Arc<dyn JobManager>` and never learn which concrete
//! manager sits behind it.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::{JobMetrics, JobResult, JobStatus, Mode, SchedulerError};

type CallbackFn = dyn Fn() -> BoxFuture<'static, Result<(), String>> + Send + Sync;

/// The unit of work a job runs on every tick.
///
/// Wraps any `Fn() -> impl Future<Output = Result<(), E>>` where `E: Display`.
/// Cloning is cheap and shares the underlying closure.
#[derive(Clone)]
pub struct JobCallback {
    inner: Arc<CallbackFn>,
}

impl JobCallback {
    pub fn new<F, Fut, E>(job_fn: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display + Send,
    {
        Self {
            inner: Arc::new(move || {
                let fut = job_fn();
                async move { fut.await.map_err(|e| e.to_string()) }.boxed()
            }),
        }
    }

    /// Run the callback once and fold every way it can end into a `JobResult`.
    ///
    /// Panics, whether raised while building the future or while polling it,
    /// become `JobResult::Failed`.
    pub async fn invoke(&self) -> JobResult {
        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| (self.inner)())) {
            Ok(fut) => fut,
            Err(payload) => return JobResult::Failed(panic_message(payload.as_ref())),
        };

        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(())) => JobResult::Success,
            Ok(Err(message)) => JobResult::Failed(message),
            Err(payload) => JobResult::Failed(panic_message(payload.as_ref())),
        }
    }
}

impl fmt::Debug for JobCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobCallback").finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

/// Operations every job manager provides.
///
/// Bookkeeping methods are synchronous; only `trigger_job` and `shutdown`
/// wait on job callbacks.
#[async_trait]
pub trait JobManager: Send + Sync {
    /// Which strategy this manager implements.
    fn mode(&self) -> Mode;

    /// Register `callback` to run every `interval`.
    ///
    /// An existing registration under `id` is stopped first, so the id never
    /// has two live timers. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// `InvalidInterval` for a zero interval, `NoRuntime` outside Tokio.
    fn schedule_job(
        &self,
        id: &str,
        name: &str,
        callback: JobCallback,
        interval: Duration,
    ) -> Result<(), SchedulerError>;

    /// Register `callback` at the interval the cron table assigns to
    /// `cron_expr`, otherwise identical to [`JobManager::schedule_job`].
    fn schedule_cron_job(
        &self,
        id: &str,
        name: &str,
        callback: JobCallback,
        cron_expr: &str,
    ) -> Result<(), SchedulerError>;

    /// Run the job's callback now, outside its timer schedule.
    ///
    /// The run goes through the same overlap guard as timer ticks and is
    /// recorded in the status and metrics, but `last_run`, `next_run` and the
    /// timer itself are left alone.
    ///
    /// # Errors
    ///
    /// - `JobNotFound` for an unknown id
    /// - `AlreadyRunning` if an execution (tick or trigger) is in flight;
    ///   nothing runs and nothing is recorded
    /// - `JobFailed` if the callback returns an error or panics; the failure
    ///   is already on the job's status and counted in the metrics
    ///
    /// Admin callers that only care whether the id exists should match on
    /// `JobNotFound` and treat the other two as run outcomes. The disabled
    /// manager always returns `Ok(())`.
    async fn trigger_job(&self, id: &str) -> Result<(), SchedulerError>;

    /// Cancel the job's timer and drop its bookkeeping.
    ///
    /// Returns the final status (state `Stopped`), or `None` if `id` was not
    /// registered. An in-flight callback is left to finish.
    fn stop_job(&self, id: &str) -> Option<JobStatus>;

    /// Stop every registered job.
    fn stop_all_jobs(&self);

    fn get_job_status(&self, id: &str) -> Option<JobStatus>;

    /// Status of every registered job, in no particular order.
    fn get_all_job_statuses(&self) -> Vec<JobStatus>;

    /// Snapshot of the aggregate metrics.
    fn get_job_metrics(&self) -> JobMetrics;

    /// Stop every job, then wait up to `grace` for in-flight executions.
    async fn shutdown(&self, _grace: Duration) {
        self.stop_all_jobs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invoke_success() {
        let callback = JobCallback::new(|| async { Ok::<_, String>(()) });
        assert_eq!(callback.invoke().await, JobResult::Success);
    }

    #[tokio::test]
    async fn test_invoke_error_is_rendered() {
        let callback =
            JobCallback::new(|| async { Err::<(), _>(SchedulerError::Config("no db".into())) });
        assert_eq!(
            callback.invoke().await,
            JobResult::Failed("Configuration error: no db".to_string())
        );
    }

    #[tokio::test]
    async fn test_invoke_catches_panic_in_future() {
        let callback = JobCallback::new(|| async {
            if true {
                panic!("sync exploded");
            }
            Ok::<_, String>(())
        });
        match callback.invoke().await {
            JobResult::Failed(message) => assert!(message.contains("sync exploded")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invoke_catches_panic_before_future() {
        let callback = JobCallback::new(|| -> futures::future::Ready<Result<(), String>> {
            panic!("{}", String::from("constructor exploded"))
        });
        match callback.invoke().await {
            JobResult::Failed(message) => assert!(message.contains("constructor exploded")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_clones_share_closure() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let callback = JobCallback::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            }
        });

        let copy = callback.clone();
        callback.invoke().await;
        copy.invoke().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
