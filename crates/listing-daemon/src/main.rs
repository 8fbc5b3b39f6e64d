//! Listing Jobs Daemon
//!
//! Runs the listing directory's recurring maintenance work (data sync,
//! cleanup, notification sweeps) behind the job manager the environment
//! selects.
//!
//! # Usage
//!
//! ```bash
//! listing-jobs start [--grace-secs N]
//! listing-jobs mode
//! listing-jobs cron "*/15 * * * *"
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/listing-jobs/config.toml)
//! 3. Environment variables (LISTING_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use listing_daemon::{show_cron, show_mode, start_daemon, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { grace_secs } => {
            start_daemon(cli.config.as_deref(), cli.log_level.as_deref(), grace_secs).await?;
        }
        Commands::Mode => {
            show_mode()?;
        }
        Commands::Cron { expr } => {
            show_cron(&expr, cli.config.as_deref())?;
        }
    }

    Ok(())
}
