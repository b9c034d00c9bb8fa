// Child process runner shared by the subprocess adapters
// reason: tokio::process keeps the runtime free while external tools run
use std::ffi::OsStr;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to spawn {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("IO error: {0}")]
    Io(String),

    #[error("{program} did not finish within {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },
}

/// Spawn `program` with `args`, capture stdout/stderr and wait for it
///
/// The child is killed when `limit` expires (or the future is dropped).
pub async fn run_command<I, S>(
    program: &str,
    args: I,
    limit: Duration,
) -> Result<Output, CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CommandError::SpawnFailed {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(CommandError::Io(e.to_string())),
        Err(_) => {
            return Err(CommandError::Timeout {
                program: program.to_string(),
                timeout_ms: limit.as_millis() as u64,
            })
        }
    };

    debug!(
        program = %program,
        exit_code = ?output.status.code(),
        "Subprocess finished"
    );
    Ok(output)
}

/// Lossy UTF-8 of stderr, trimmed (for error messages)
pub(crate) fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
