//! Listing jobs daemon library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (start, mode, cron)
//! - `context`: Application context owning the job manager
//! - `jobs`: Callbacks that run external maintenance programs
//! - `settings`: Layered configuration

pub mod cli;
pub mod commands;
pub mod context;
pub mod jobs;
pub mod settings;

pub use cli::{Cli, Commands};
pub use commands::{run_until, show_cron, show_mode, start_daemon};
pub use context::AppContext;
pub use settings::{JobDefinition, JobSchedule, Settings};
