//! Error types for the scheduler crate.
//!
//! Covers the failure modes callers can observe through the job manager:
//! unknown jobs, guarded overlaps, failed callbacks and bad registrations.

use thiserror::Error;

/// Errors that can occur during job manager operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// No job is registered under this id
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// The job is already executing; the request was not queued
    #[error("Job is already running: {0}")]
    AlreadyRunning(String),

    /// The job callback returned an error or panicked
    #[error("Job {id} failed: {message}")]
    JobFailed { id: String, message: String },

    /// A zero-length interval was supplied at registration
    #[error("Invalid interval for job {0}: interval must be greater than zero")]
    InvalidInterval(String),

    /// Timers need a Tokio runtime and none is running on this thread
    #[error("No Tokio runtime available to drive job timers")]
    NoRuntime,

    /// Configuration could not be loaded or validated
    #[error("Configuration error: {0}")]
    Config(String),
}
