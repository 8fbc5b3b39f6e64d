//! Behaviour every job manager must show through the `JobManager` contract.
//!
//! These tests drive managers only through `ManagerHolder` and
//! `Arc<dyn JobManager>`, the way process bootstrap and admin endpoints do.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::SecretString;
use tokio::time::Instant;

use listing_scheduler::{
    JobCallback, JobManager, JobMetrics, JobState, ManagerHolder, Mode, ModeInputs,
    SchedulerConfig, SchedulerError,
};

fn local_manager() -> (ManagerHolder, Arc<dyn JobManager>) {
    let holder = ManagerHolder::with_inputs(SchedulerConfig::default(), ModeInputs::default);
    let manager = holder.get_manager();
    (holder, manager)
}

fn hosted_inputs() -> ModeInputs {
    ModeInputs {
        hosted_enabled: Some("true".to_string()),
        hosted_api_key: Some(SecretString::from("api-key".to_string())),
        hosted_api_url: Some("https://scheduler.example.com".to_string()),
        app_env: Some("production".to_string()),
        ..Default::default()
    }
}

fn counter_callback(counter: Arc<AtomicU32>) -> JobCallback {
    JobCallback::new(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        }
    })
}

#[tokio::test(start_paused = true)]
async fn sync_job_runs_three_or_four_times_in_350ms() {
    let (_holder, manager) = local_manager();
    let counter = Arc::new(AtomicU32::new(0));

    manager
        .schedule_job(
            "sync",
            "Data sync",
            counter_callback(counter.clone()),
            Duration::from_millis(100),
        )
        .unwrap();
    tokio::time::sleep(Duration::from_millis(350)).await;

    let runs = counter.load(Ordering::SeqCst);
    assert!((3..=4).contains(&runs), "ran {} times", runs);
}

#[tokio::test(start_paused = true)]
async fn status_exists_exactly_while_registered() {
    let (_holder, manager) = local_manager();
    let ids = ["sync", "cleanup", "notify", "expire-listings"];

    for id in ids {
        manager
            .schedule_job(id, id, counter_callback(Arc::default()), Duration::from_millis(75))
            .unwrap();
        assert!(manager.get_job_status(id).is_some(), "{}", id);
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    for id in ids {
        manager.stop_job(id);
        assert!(manager.get_job_status(id).is_none(), "{}", id);
    }
    assert!(manager.get_all_job_statuses().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unknown_ids_trigger_error_and_stop_quietly() {
    let (_holder, manager) = local_manager();

    let result = manager.trigger_job("unregistered").await;
    assert!(matches!(result, Err(SchedulerError::JobNotFound(id)) if id == "unregistered"));

    assert!(manager.stop_job("unregistered").is_none());
}

#[tokio::test(start_paused = true)]
async fn rescheduling_never_overlaps_executions() {
    let (_holder, manager) = local_manager();
    let starts: Arc<Mutex<Vec<Instant>>> = Arc::default();
    let callback_ms = 30;

    let make = || {
        let starts = starts.clone();
        JobCallback::new(move || {
            let starts = starts.clone();
            async move {
                starts.lock().unwrap().push(Instant::now());
                tokio::time::sleep(Duration::from_millis(callback_ms)).await;
                Ok::<_, String>(())
            }
        })
    };

    for round in 0..8u64 {
        manager
            .schedule_job("sync", "Sync", make(), Duration::from_millis(10))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(45 + round * 7)).await;
    }
    manager.stop_all_jobs();

    let starts = starts.lock().unwrap();
    assert!(starts.len() >= 8, "only {} executions", starts.len());
    for pair in starts.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            gap >= Duration::from_millis(callback_ms),
            "executions started {:?} apart",
            gap
        );
    }
}

#[tokio::test(start_paused = true)]
async fn failure_counts_once_and_job_keeps_ticking() {
    let (_holder, manager) = local_manager();
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let callback = JobCallback::new(move || {
        let counter = counter.clone();
        async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err("first attempt fails".to_string())
            } else {
                Ok(())
            }
        }
    });

    manager
        .schedule_job("notify", "Notification sweep", callback, Duration::from_millis(100))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    let status = manager.get_job_status("notify").unwrap();
    assert_eq!(status.status, JobState::Failed);
    assert_eq!(status.error.as_deref(), Some("first attempt fails"));
    assert_eq!(manager.get_job_metrics().failed_jobs, 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let status = manager.get_job_status("notify").unwrap();
    assert_eq!(status.status, JobState::Completed);
    assert!(status.error.is_none());

    let metrics = manager.get_job_metrics();
    assert_eq!(metrics.failed_jobs, 1);
    assert_eq!(metrics.successful_jobs, 1);
}

#[tokio::test(start_paused = true)]
async fn error_is_cleared_when_the_next_run_starts() {
    let (_holder, manager) = local_manager();
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let callback = JobCallback::new(move || {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err("first attempt fails".to_string());
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        }
    });

    manager
        .schedule_job("notify", "Notification sweep", callback, Duration::from_millis(100))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(120)).await;
    let status = manager.get_job_status("notify").unwrap();
    assert_eq!(status.status, JobState::Failed);
    assert_eq!(status.error.as_deref(), Some("first attempt fails"));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let status = manager.get_job_status("notify").unwrap();
    assert_eq!(status.status, JobState::Running);
    assert!(status.error.is_none());

    let stopped = manager.stop_job("notify").unwrap();
    assert_eq!(stopped.status, JobState::Stopped);
    assert!(stopped.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn counters_balance_for_mixed_outcomes() {
    let (_holder, manager) = local_manager();
    let outcomes = [true, false, false, true, true, false, true, true];

    for (i, ok) in outcomes.iter().enumerate() {
        let ok = *ok;
        let callback = JobCallback::new(move || async move {
            if ok {
                Ok(())
            } else {
                Err(format!("run {} failed", i))
            }
        });
        manager
            .schedule_job("mixed", "Mixed", callback, Duration::from_secs(3600))
            .unwrap();
        let result = manager.trigger_job("mixed").await;
        if ok {
            assert_eq!(result, Ok(()));
        } else {
            assert_eq!(
                result,
                Err(SchedulerError::JobFailed {
                    id: "mixed".to_string(),
                    message: format!("run {} failed", i),
                })
            );
        }

        let metrics = manager.get_job_metrics();
        assert_eq!(metrics.successful_jobs + metrics.failed_jobs, metrics.total_executions);
        assert_eq!(metrics.total_executions, i as u64 + 1);
    }

    let metrics = manager.get_job_metrics();
    assert_eq!(metrics.successful_jobs, 5);
    assert_eq!(metrics.failed_jobs, 3);
}

#[tokio::test(start_paused = true)]
async fn average_duration_is_mean_of_samples() {
    let (_holder, manager) = local_manager();
    let durations = [25u64, 100, 5, 60, 35];

    for ms in durations {
        let callback = JobCallback::new(move || async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok::<_, String>(())
        });
        manager
            .schedule_job("timed", "Timed", callback, Duration::from_secs(3600))
            .unwrap();
        manager.trigger_job("timed").await.unwrap();
    }

    let expected = durations.iter().sum::<u64>() as f64 / durations.len() as f64;
    let avg = manager.get_job_metrics().average_job_duration.unwrap();
    assert!((avg - expected).abs() < 1e-9, "avg {} != {}", avg, expected);
}

#[tokio::test(start_paused = true)]
async fn reset_then_get_yields_empty_manager() {
    let (holder, manager) = local_manager();
    manager
        .schedule_job("sync", "Sync", counter_callback(Arc::default()), Duration::from_millis(50))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(manager.get_job_metrics().total_executions > 0);

    holder.reset_manager();
    let fresh = holder.get_manager();

    assert!(fresh.get_all_job_statuses().is_empty());
    assert_eq!(fresh.get_job_metrics(), JobMetrics::default());
}

#[tokio::test(start_paused = true)]
async fn metrics_are_snapshots() {
    let (_holder, manager) = local_manager();
    let before = manager.get_job_metrics();

    manager
        .schedule_job("sync", "Sync", counter_callback(Arc::default()), Duration::from_millis(50))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(before.total_executions, 0);
    assert_eq!(manager.get_job_metrics().total_executions, 1);
}

#[test]
fn disable_flag_wins_over_hosted_configuration() {
    let holder = ManagerHolder::with_inputs(SchedulerConfig::default(), || ModeInputs {
        disabled: Some("true".to_string()),
        ..hosted_inputs()
    });
    assert_eq!(holder.get_manager().mode(), Mode::Disabled);
    assert_eq!(holder.resolved_mode(), Some(Mode::Disabled));
}

#[tokio::test(start_paused = true)]
async fn every_mode_honours_the_contract_shape() {
    let cases: Vec<(ModeInputs, Mode, bool)> = vec![
        (ModeInputs::default(), Mode::Local, true),
        (hosted_inputs(), Mode::Hosted, true),
        (
            ModeInputs {
                platform_marker: Some("1".to_string()),
                ..Default::default()
            },
            Mode::Platform,
            true,
        ),
        (
            ModeInputs {
                disabled: Some("yes".to_string()),
                ..Default::default()
            },
            Mode::Disabled,
            false,
        ),
    ];

    for (inputs, expected_mode, runs_jobs) in cases {
        let holder = ManagerHolder::with_inputs(SchedulerConfig::default(), move || inputs.clone());
        let manager = holder.get_manager();
        assert_eq!(holder.resolved_mode(), Some(expected_mode));

        let counter = Arc::new(AtomicU32::new(0));
        manager
            .schedule_cron_job(
                "sweep",
                "Sweep",
                counter_callback(counter.clone()),
                "*/30 * * * * *",
            )
            .unwrap();
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(counter.load(Ordering::SeqCst), u32::from(runs_jobs), "{:?}", expected_mode);
        assert_eq!(manager.get_job_status("sweep").is_some(), runs_jobs);

        manager.shutdown(Duration::from_secs(1)).await;
        assert!(manager.get_all_job_statuses().is_empty());
    }
}
