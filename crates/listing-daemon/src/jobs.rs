//! Job callbacks backed by external maintenance programs.
//!
//! Each configured job runs its `command` to completion on every tick. A
//! non-zero exit is a failed run; the tail of stderr becomes the error
//! message shown on the job's status.

use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use listing_scheduler::JobCallback;

/// Bytes of stderr kept in a failure message.
const STDERR_TAIL: usize = 512;

/// Ways a command-backed job can fail.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no program configured")]
    EmptyCommand,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    ExitStatus {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Run `argv` once and wait for it to exit.
pub async fn run_command(argv: &[String]) -> Result<(), CommandError> {
    let (program, args) = argv.split_first().ok_or(CommandError::EmptyCommand)?;

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

    if output.status.success() {
        debug!(program = %program, "Command finished");
        return Ok(());
    }

    Err(CommandError::ExitStatus {
        program: program.clone(),
        status: output.status,
        stderr: stderr_tail(&output.stderr),
    })
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}

/// Callback that runs `argv` on every invocation.
pub fn command_callback(argv: Vec<String>) -> JobCallback {
    JobCallback::new(move || {
        let argv = argv.clone();
        async move { run_command(&argv).await }
    })
}
