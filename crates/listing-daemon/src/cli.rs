//! CLI argument parsing for the jobs daemon.
//!
//! CLI flags override every other configuration source.

use clap::{Parser, Subcommand};

/// Listing Jobs Daemon
///
/// Runs the listing directory's recurring maintenance jobs.
#[derive(Parser, Debug)]
#[command(name = "listing-jobs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/listing-jobs/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Daemon commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register configured jobs and run until SIGINT/SIGTERM
    Start {
        /// Override shutdown grace period in seconds
        #[arg(long)]
        grace_secs: Option<u64>,
    },

    /// Print the job manager mode the current environment selects
    Mode,

    /// Print the interval a cron expression is translated to
    Cron {
        /// Cron expression, e.g. "*/15 * * * *"
        expr: String,
    },
}
