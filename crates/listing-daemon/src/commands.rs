//! Command implementations for the jobs daemon.
//!
//! Handles:
//! - start: load config, register jobs, run until a shutdown signal
//! - mode: report which job manager the environment selects
//! - cron: report how a cron expression is translated

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use listing_scheduler::{cron, resolve_mode, JobManager};

use crate::context::AppContext;
use crate::settings::Settings;

fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

fn log_metrics(manager: &dyn JobManager) {
    let metrics = manager.get_job_metrics();
    info!(
        jobs = manager.get_all_job_statuses().len(),
        total = metrics.total_executions,
        successful = metrics.successful_jobs,
        failed = metrics.failed_jobs,
        avg_duration_ms = metrics.average_job_duration.unwrap_or(0.0),
        "Job metrics"
    );
}

/// Run the scheduler until `shutdown` resolves, then stop every job.
///
/// Returns the final status report as pretty JSON.
pub async fn run_until<F>(ctx: &AppContext, shutdown: F) -> Result<String>
where
    F: std::future::Future<Output = ()>,
{
    ctx.register_configured_jobs()
        .context("Failed to register configured jobs")?;
    let manager = ctx.jobs();

    let period = ctx.settings().metrics_log_secs;
    let metrics_logger = async {
        if period == 0 {
            return std::future::pending::<()>().await;
        }
        let mut ticker = tokio::time::interval(Duration::from_secs(period));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            log_metrics(manager.as_ref());
        }
    };

    tokio::select! {
        _ = shutdown => {}
        _ = metrics_logger => {}
    }

    let mut statuses = manager.get_all_job_statuses();
    statuses.sort_by(|a, b| a.id.cmp(&b.id));
    let report = serde_json::json!({
        "mode": manager.mode(),
        "jobs": statuses,
        "metrics": manager.get_job_metrics(),
    });

    ctx.shutdown().await;
    serde_json::to_string_pretty(&report).context("Failed to render status report")
}

/// Start the jobs daemon.
///
/// 1. Load configuration (defaults -> file -> env -> CLI)
/// 2. Resolve the job manager mode and register configured jobs
/// 3. Handle graceful shutdown on SIGINT/SIGTERM
pub async fn start_daemon(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    grace_override: Option<u64>,
) -> Result<()> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(grace) = grace_override {
        settings.scheduler.shutdown_grace_secs = grace;
    }

    init_logging(&settings.log_level)?;

    info!("Listing jobs daemon starting...");
    info!("  Jobs configured: {}", settings.jobs.len());
    info!("  Shutdown grace: {}s", settings.scheduler.shutdown_grace_secs);
    info!("  Log level: {}", settings.log_level);

    let ctx = AppContext::new(settings);
    let report = run_until(&ctx, shutdown_signal()).await?;

    println!("{}", report);
    info!("Listing jobs daemon stopped");
    Ok(())
}

/// Print the mode the current environment selects.
pub fn show_mode() -> Result<()> {
    println!("{}", resolve_mode());
    Ok(())
}

/// Print how a cron expression is translated.
pub fn show_cron(expr: &str, config_path: Option<&str>) -> Result<()> {
    let settings = Settings::load(config_path).context("Failed to load configuration")?;
    let fallback = settings.scheduler.default_cron_interval();

    match cron::lookup(expr) {
        Some(preset) => println!(
            "{} -> {:?}, every {} ms",
            expr,
            preset,
            preset.interval().as_millis()
        ),
        None => println!(
            "{} -> not recognised, fallback every {} ms",
            expr,
            cron::interval_or(expr, fallback).as_millis()
        ),
    }
    Ok(())
}
