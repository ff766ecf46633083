//! Running external tools under job control.
//!
//! Every yt-dlp and ffmpeg invocation that belongs to a job goes through
//! [`run_tool`]. The running child is registered with the job as a
//! [`ProcessHandle`] so that a cancellation request can terminate it, and
//! the job's cancellation token is raced against the child's completion.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::job::JobControl;

/// Errors from running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The binary does not exist.
    #[error("{program} not found")]
    NotFound { program: PathBuf },

    /// The process could not be started or awaited.
    #[error("Failed to run {program}: {source}")]
    Io {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully.
    #[error("{program} exited with code {code:?}")]
    Failed {
        program: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    /// The owning job was cancelled before or while the process ran.
    #[error("Cancelled")]
    Cancelled,
}

impl ToolError {
    /// Diagnostic text suitable for a job message: the tool's stderr when it
    /// produced any, otherwise the error itself.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Failed { stderr, .. } if !stderr.trim().is_empty() => {
                stderr.trim().to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Captured output of a successful tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Handle to a running external process, held weakly by its job.
///
/// Termination is signalled at most once no matter how many callers ask.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    terminated: AtomicBool,
    kill: Notify,
}

impl ProcessHandle {
    pub fn new(pid: Option<u32>) -> Self {
        Self {
            pid,
            terminated: AtomicBool::new(false),
            kill: Notify::new(),
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Requests termination of the process.
    ///
    /// Returns `true` only for the call that actually sent the signal.
    pub fn terminate(&self) -> bool {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return false;
        }
        // notify_one stores a permit when nobody is waiting yet
        self.kill.notify_one();
        true
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    async fn terminated(&self) {
        self.kill.notified().await;
    }
}

/// Runs `command` to completion on behalf of a job.
///
/// The job's token is checked before spawning, so a job cancelled at this
/// checkpoint never starts a process. While the child runs it is attached to
/// the job; cancellation or an explicit [`ProcessHandle::terminate`] kills it
/// and yields [`ToolError::Cancelled`].
pub async fn run_tool(mut command: Command, control: &JobControl) -> Result<ToolOutput, ToolError> {
    if control.is_cancelled() {
        return Err(ToolError::Cancelled);
    }

    let program = PathBuf::from(command.as_std().get_program());
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ToolError::NotFound {
                program: program.clone(),
            }
        } else {
            ToolError::Io {
                program: program.clone(),
                source: e,
            }
        }
    })?;

    let handle = Arc::new(ProcessHandle::new(child.id()));
    control.attach(&handle).await;
    debug!(
        job_id = %control.job_id(),
        pid = ?handle.pid(),
        "Started {}",
        program.display()
    );

    let stdout_reader = tokio::spawn(drain(child.stdout.take()));
    let stderr_reader = tokio::spawn(drain(child.stderr.take()));

    let outcome: Option<std::io::Result<ExitStatus>> = tokio::select! {
        status = child.wait() => Some(status),
        _ = control.token().cancelled() => None,
        _ = handle.terminated() => None,
    };

    control.detach().await;

    let status = match outcome {
        Some(status) => status.map_err(|e| ToolError::Io {
            program: program.clone(),
            source: e,
        })?,
        None => {
            if let Err(e) = child.start_kill() {
                warn!(
                    job_id = %control.job_id(),
                    "Failed to kill {}: {}",
                    program.display(),
                    e
                );
            }
            let _ = child.wait().await;
            stdout_reader.abort();
            stderr_reader.abort();
            debug!(job_id = %control.job_id(), "Killed {}", program.display());
            return Err(ToolError::Cancelled);
        }
    };

    let output = ToolOutput {
        stdout: stdout_reader.await.unwrap_or_default(),
        stderr: stderr_reader.await.unwrap_or_default(),
    };

    if !status.success() {
        return Err(ToolError::Failed {
            program,
            code: status.code(),
            stderr: output.stderr_lossy(),
        });
    }

    Ok(output)
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buffer).await;
    }
    buffer
}
