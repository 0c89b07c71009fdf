//! Watched command execution.
//!
//! Each command runs through `sh -c` with stdout and stderr piped. A command
//! that outlives its timeout is killed and reaped. Output is decoded lossily
//! so invalid UTF-8 never aborts a round.

use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Failed to spawn command '{cmd}': {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command '{cmd}' timed out after {} ms and was killed", .timeout.as_millis())]
    Timeout { cmd: String, timeout: Duration },
    #[error("{}", failure_message(.cmd, .code, .stderr))]
    Failed {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("I/O error while running '{cmd}': {source}")]
    Io {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
}

fn failure_message(cmd: &str, code: &Option<i32>, stderr: &str) -> String {
    if stderr.is_empty() {
        format!("Command '{cmd}' failed with exit code: {code:?}")
    } else {
        format!("Command '{cmd}' failed with stderr: {stderr}")
    }
}

/// Run `cmd` under `sh -c`, returning its stdout.
pub async fn run_command(cmd: &str, timeout: Duration) -> Result<String, ExecError> {
    let child = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExecError::Spawn {
            cmd: cmd.to_string(),
            source,
        })?;

    // Dropping the `wait_with_output` future on timeout drops the child, and
    // `kill_on_drop` kills it; tokio reaps it in the background.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(res) => res.map_err(|source| ExecError::Io {
            cmd: cmd.to_string(),
            source,
        })?,
        Err(_) => {
            warn!(target: "exec", cmd, timeout_ms = timeout.as_millis() as u64, "command_timeout");
            return Err(ExecError::Timeout {
                cmd: cmd.to_string(),
                timeout,
            });
        }
    };

    if !output.status.success() {
        return Err(ExecError::Failed {
            cmd: cmd.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    debug!(target: "exec", cmd, bytes = output.stdout.len(), "command_finished");
    Ok(match String::from_utf8(output.stdout) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Start every command of a round concurrently. Handles are returned in
/// command order so output is consumed in that order regardless of which
/// command finishes first.
pub fn spawn_round(
    commands: &[String],
    timeout: Duration,
) -> Vec<JoinHandle<Result<String, ExecError>>> {
    commands
        .iter()
        .cloned()
        .map(|cmd| tokio::spawn(async move { run_command(&cmd, timeout).await }))
        .collect()
}
