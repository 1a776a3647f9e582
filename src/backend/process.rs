//! Shell commands with a bounded wait and a table of backgrounded processes.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::{Result, TillerError};

pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// How long to wait for pipe readers after the process exits. A grandchild
/// that inherited the pipes can keep them open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CmdStatus {
    Completed,
    Running,
}

/// Snapshot of a command's state and captured output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdResult {
    pub status: CmdStatus,
    /// Opaque handle for `check_background_cmd` / `kill_background_cmd`.
    pub pid: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

type OutputBuffer = Arc<Mutex<Vec<u8>>>;

struct BackgroundProcess {
    child: Child,
    stdout: OutputBuffer,
    stderr: OutputBuffer,
    readers: Vec<JoinHandle<()>>,
}

/// Processes that outlived their initial wait, keyed by handle.
///
/// An entry lives until `check` reports it completed or `kill` stops it.
/// Dropping the table kills whatever is still running.
#[derive(Clone, Default)]
pub struct ProcessTable {
    processes: Arc<Mutex<HashMap<String, BackgroundProcess>>>,
}

impl std::fmt::Debug for ProcessTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessTable").finish_non_exhaustive()
    }
}

fn shell_command(command: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}

fn spawn_reader<R>(mut pipe: R, buffer: OutputBuffer) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; 4096];
        loop {
            match pipe.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buffer.lock().await.extend_from_slice(&chunk[..n]),
            }
        }
    })
}

async fn snapshot(buffer: &OutputBuffer) -> String {
    String::from_utf8_lossy(&buffer.lock().await).to_string()
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `command` in `cwd`, waiting at most `timeout`.
    ///
    /// Commands still running at the deadline keep running and are stored
    /// under the returned handle with status [`CmdStatus::Running`].
    pub async fn exec(&self, command: &str, cwd: &Path, timeout: Duration) -> Result<CmdResult> {
        let mut cmd = shell_command(command);
        if !cwd.as_os_str().is_empty() {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| TillerError::backend(format!("Failed to spawn: {e}")))?;

        let stdout_buf = OutputBuffer::default();
        let stderr_buf = OutputBuffer::default();
        let mut readers = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            readers.push(spawn_reader(out, stdout_buf.clone()));
        }
        if let Some(err) = child.stderr.take() {
            readers.push(spawn_reader(err, stderr_buf.clone()));
        }

        let pid = uuid::Uuid::new_v4().to_string();
        tracing::debug!(%pid, command, cwd = %cwd.display(), "spawned command");

        tokio::select! {
            status = child.wait() => {
                let status = status
                    .map_err(|e| TillerError::backend(format!("Process error: {e}")))?;
                let _ = tokio::time::timeout(DRAIN_GRACE, futures::future::join_all(readers)).await;
                Ok(CmdResult {
                    status: CmdStatus::Completed,
                    pid,
                    stdout: snapshot(&stdout_buf).await,
                    stderr: snapshot(&stderr_buf).await,
                    exit_code: status.code(),
                })
            }
            _ = tokio::time::sleep(timeout) => {
                let result = CmdResult {
                    status: CmdStatus::Running,
                    pid: pid.clone(),
                    stdout: snapshot(&stdout_buf).await,
                    stderr: snapshot(&stderr_buf).await,
                    exit_code: None,
                };
                self.processes.lock().await.insert(pid.clone(), BackgroundProcess {
                    child,
                    stdout: stdout_buf,
                    stderr: stderr_buf,
                    readers,
                });
                tracing::debug!(%pid, "command moved to background");
                Ok(result)
            }
        }
    }

    /// Poll a backgrounded process without blocking.
    ///
    /// The first poll that sees the process exited returns its final output
    /// and releases the handle.
    pub async fn check(&self, pid: &str) -> Result<CmdResult> {
        let not_found = || TillerError::backend(format!("Process not found: {pid}"));
        let mut processes = self.processes.lock().await;
        let proc = processes.get_mut(pid).ok_or_else(not_found)?;

        let exited = proc
            .child
            .try_wait()
            .map_err(|e| TillerError::backend(format!("Error checking process: {e}")))?;
        let Some(status) = exited else {
            return Ok(CmdResult {
                status: CmdStatus::Running,
                pid: pid.to_string(),
                stdout: snapshot(&proc.stdout).await,
                stderr: snapshot(&proc.stderr).await,
                exit_code: None,
            });
        };

        let proc = processes.remove(pid).ok_or_else(not_found)?;
        drop(processes);
        let _ = tokio::time::timeout(DRAIN_GRACE, futures::future::join_all(proc.readers)).await;
        tracing::debug!(%pid, "background command completed");
        Ok(CmdResult {
            status: CmdStatus::Completed,
            pid: pid.to_string(),
            stdout: snapshot(&proc.stdout).await,
            stderr: snapshot(&proc.stderr).await,
            exit_code: status.code(),
        })
    }

    /// Stop a backgrounded process and forget it. Unknown handles are ignored.
    pub async fn kill(&self, pid: &str) -> Result<()> {
        let removed = self.processes.lock().await.remove(pid);
        if let Some(mut proc) = removed {
            let _ = proc.child.kill().await;
            tracing::debug!(%pid, "killed background command");
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.processes.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fast_command_completes_with_output() {
        let table = ProcessTable::new();
        let dir = tempfile::tempdir().unwrap();

        let result = table
            .exec("echo hi; echo oops >&2; exit 3", dir.path(), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(result.status, CmdStatus::Completed);
        assert_eq!(result.stdout, "hi\n");
        assert_eq!(result.stderr, "oops\n");
        assert_eq!(result.exit_code, Some(3));
        assert!(table.is_empty().await);
    }

    #[tokio::test]
    async fn slow_command_is_backgrounded_then_killed() {
        let table = ProcessTable::new();
        let dir = tempfile::tempdir().unwrap();

        let result = table
            .exec("sleep 30", dir.path(), Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(result.status, CmdStatus::Running);

        let polled = table.check(&result.pid).await.unwrap();
        assert_eq!(polled.status, CmdStatus::Running);

        table.kill(&result.pid).await.unwrap();
        assert!(table.check(&result.pid).await.is_err());
    }

    #[tokio::test]
    async fn background_command_finishes_later() {
        let table = ProcessTable::new();
        let dir = tempfile::tempdir().unwrap();

        let result = table
            .exec("sleep 0.3; echo done", dir.path(), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(result.status, CmdStatus::Running);

        let mut polled = table.check(&result.pid).await.unwrap();
        for _ in 0..50 {
            if polled.status == CmdStatus::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            polled = table.check(&result.pid).await.unwrap();
        }
        assert_eq!(polled.status, CmdStatus::Completed);
        assert_eq!(polled.exit_code, Some(0));
        assert_eq!(polled.stdout, "done\n");

        // Reported once, then released.
        assert!(table.is_empty().await);
        assert!(table.check(&result.pid).await.is_err());
    }
}
