//! Subprocess execution of maintenance tasks.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use chrono::Utc;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use upkeep_core::{TaskDescriptor, TaskError, TaskResult};

use crate::capture::OutputCapture;
use crate::process_group::{self, ProcessGroup};

/// Environment variable carrying the store URI into each task.
pub const STORE_URI_ENV: &str = "STORE_URI";

/// How long to wait for output pipes to drain after killing a task.
const KILL_OUTPUT_GRACE: Duration = Duration::from_secs(2);

/// Executes task descriptors as external processes.
///
/// Each call to [`run`](Self::run) spawns a fresh process in its own process
/// group, captures its stdout/stderr in full and waits for it to exit. The
/// whole group is killed once the attempt ends, and also if the returned
/// future is dropped before it finishes.
#[derive(Debug, Clone, Default)]
pub struct TaskExecutor {
    /// Additional environment variables.
    env_vars: Vec<(String, String)>,

    /// Per-task timeout (optional).
    timeout: Option<Duration>,

    /// Working directory for children (optional).
    working_dir: Option<PathBuf>,
}

enum Ending {
    Exited(ExitStatus),
    WaitFailed(std::io::Error),
    TimedOut(Duration),
    Interrupted,
}

impl TaskExecutor {
    /// Create an executor with no timeout and the inherited environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Pass the store URI to every task through [`STORE_URI_ENV`].
    pub fn with_store_uri(self, uri: impl Into<String>) -> Self {
        self.with_env(STORE_URI_ENV, uri)
    }

    /// Kill tasks that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run children in `dir`.
    pub fn with_working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Run one task to completion.
    ///
    /// Never fails: spawn errors, non-zero exits and timeouts come back as a
    /// Failure result.
    pub async fn run(&self, descriptor: &TaskDescriptor) -> TaskResult {
        self.run_until(descriptor, std::future::pending()).await
    }

    /// Run one task, stopping it early if `cancel` resolves first.
    ///
    /// A cancelled task is killed together with everything it forked and
    /// recorded as interrupted, keeping the output it produced so far.
    pub async fn run_until<C>(&self, descriptor: &TaskDescriptor, cancel: C) -> TaskResult
    where
        C: Future<Output = ()>,
    {
        let started_at = Utc::now();
        let deadline = self.timeout.map(|limit| (limit, Instant::now() + limit));
        let name = descriptor.name.as_str();

        let mut cmd = Command::new(&descriptor.command.program);
        cmd.args(&descriptor.command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        process_group::isolate(&mut cmd);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        info!(task = %name, command = %descriptor.command, "Spawning task process");
        debug!("Full command: {:?}", cmd);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(task = %name, error = %e, "Failed to spawn task process");
                return TaskResult::failure(
                    name,
                    started_at,
                    TaskError::SpawnFailed {
                        reason: e.to_string(),
                    },
                    "",
                    "",
                );
            }
        };

        let group = ProcessGroup::new(child.id());
        let mut stdout = OutputCapture::spawn(child.stdout.take(), "stdout");
        let mut stderr = OutputCapture::spawn(child.stderr.take(), "stderr");

        // The deadline covers both the exit and the pipes closing: a
        // background process holding stdout open still counts as running.
        let ending = tokio::select! {
            exited = async {
                let status = child.wait().await;
                stdout.closed().await;
                stderr.closed().await;
                status
            } => match exited {
                Ok(status) => Ending::Exited(status),
                Err(e) => Ending::WaitFailed(e),
            },
            limit = deadline_elapsed(deadline) => {
                warn!(task = %name, timeout_ms = limit.as_millis() as u64, "Task timed out, killing");
                Ending::TimedOut(limit)
            }
            _ = cancel => {
                warn!(task = %name, "Task interrupted, killing");
                Ending::Interrupted
            }
        };

        // Nothing the task started may keep running into the next task.
        group.kill();
        if !matches!(ending, Ending::Exited(_)) {
            if let Err(e) = child.start_kill() {
                debug!(task = %name, error = %e, "Task leader already gone");
            }
            let drained = tokio::time::timeout(KILL_OUTPUT_GRACE, async {
                let _ = child.wait().await;
                stdout.closed().await;
                stderr.closed().await;
            })
            .await;
            if drained.is_err() {
                warn!(task = %name, "Task output still open after kill, keeping partial output");
            }
        }

        let stdout = stdout.finish();
        let stderr = stderr.finish();

        let error = match ending {
            Ending::Exited(status) if status.success() => None,
            Ending::Exited(status) => Some(status_error(status)),
            Ending::WaitFailed(e) => {
                error!(task = %name, error = %e, "Failed waiting for task process");
                Some(TaskError::SpawnFailed {
                    reason: e.to_string(),
                })
            }
            Ending::TimedOut(limit) => Some(TaskError::TimedOut {
                after_ms: limit.as_millis() as u64,
            }),
            Ending::Interrupted => Some(TaskError::Interrupted),
        };

        let result = match error {
            None => TaskResult::success(name, started_at, stdout, stderr),
            Some(error) => TaskResult::failure(name, started_at, error, stdout, stderr),
        };
        info!(
            task = %name,
            success = result.is_success(),
            error = ?result.error,
            duration_ms = result.duration_ms(),
            "Task process finished"
        );
        result
    }
}

/// Resolves with the limit once the deadline passes, never without one.
async fn deadline_elapsed(deadline: Option<(Duration, Instant)>) -> Duration {
    match deadline {
        Some((limit, at)) => {
            tokio::time::sleep_until(at).await;
            limit
        }
        None => std::future::pending().await,
    }
}

fn status_error(status: ExitStatus) -> TaskError {
    match status.code() {
        Some(code) => TaskError::NonZeroExit { code },
        None => TaskError::Terminated {
            signal: exit_signal(status),
        },
    }
}

#[cfg(unix)]
fn exit_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: ExitStatus) -> Option<i32> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use upkeep_core::{TaskCommand, TaskStatus};

    use super::*;

    fn shell(name: &str, script: &str) -> TaskDescriptor {
        TaskDescriptor::new(name, TaskCommand::new("sh").arg("-c").arg(script), "")
    }

    #[test]
    fn test_executor_builder() {
        let executor = TaskExecutor::new()
            .with_store_uri("postgres://db/app")
            .with_timeout(Duration::from_secs(30))
            .with_working_dir("/tmp");

        assert_eq!(
            executor.env_vars,
            vec![(STORE_URI_ENV.to_string(), "postgres://db/app".to_string())]
        );
        assert_eq!(executor.timeout, Some(Duration::from_secs(30)));
        assert_eq!(executor.working_dir, Some(PathBuf::from("/tmp")));
    }

    #[tokio::test]
    async fn test_success_captures_output() {
        let result = TaskExecutor::new()
            .run(&shell("ok", "echo hello; echo warn >&2"))
            .await;

        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(result.name, "ok");
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.stderr, "warn\n");
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let result = TaskExecutor::new()
            .run(&shell("bad", "echo partial; exit 3"))
            .await;

        assert_eq!(result.status, TaskStatus::Failure);
        assert_eq!(result.error, Some(TaskError::NonZeroExit { code: 3 }));
        assert_eq!(result.stdout, "partial\n");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_failure() {
        let task = TaskDescriptor::new(
            "ghost",
            TaskCommand::new("upkeep-definitely-not-a-real-binary"),
            "",
        );
        let result = TaskExecutor::new().run(&task).await;

        assert_eq!(result.status, TaskStatus::Failure);
        assert!(matches!(result.error, Some(TaskError::SpawnFailed { .. })));
        assert!(result.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_store_uri_passed_through_env() {
        let result = TaskExecutor::new()
            .with_store_uri("postgres://example/db")
            .run(&shell("env", "printf '%s' \"$STORE_URI\""))
            .await;

        assert!(result.is_success());
        assert_eq!(result.stdout, "postgres://example/db");
    }

    #[tokio::test]
    async fn test_timeout_kills_task() {
        let task = TaskDescriptor::new("slow", TaskCommand::new("sleep").arg("30"), "");
        let result = TaskExecutor::new()
            .with_timeout(Duration::from_millis(200))
            .run(&task)
            .await;

        assert_eq!(result.status, TaskStatus::Failure);
        assert_eq!(result.error, Some(TaskError::TimedOut { after_ms: 200 }));
        assert!(result.duration_ms() < 10_000);
    }

    #[tokio::test]
    async fn test_timeout_covers_background_holding_output() {
        let started = std::time::Instant::now();
        let result = TaskExecutor::new()
            .with_timeout(Duration::from_millis(300))
            .run(&shell("bg", "sleep 30 & echo x"))
            .await;

        assert_eq!(result.error, Some(TaskError::TimedOut { after_ms: 300 }));
        assert_eq!(result.stdout, "x\n");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_timeout_kills_forked_processes() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let script = format!("(sleep 1; touch '{}') & wait", marker.display());

        let result = TaskExecutor::new()
            .with_timeout(Duration::from_millis(200))
            .run(&shell("forks", &script))
            .await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(result.error, Some(TaskError::TimedOut { after_ms: 200 }));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_detached_leftovers_do_not_outlive_task() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let script = format!(
            "(sleep 1; touch '{}') >/dev/null 2>&1 & echo done",
            marker.display()
        );

        let result = TaskExecutor::new().run(&shell("detach", &script)).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(result.is_success());
        assert_eq!(result.stdout, "done\n");
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_cancel_keeps_partial_output() {
        let cancel = tokio::time::sleep(Duration::from_millis(300));
        let result = TaskExecutor::new()
            .run_until(&shell("long", "echo early; sleep 30"), cancel)
            .await;

        assert_eq!(result.error, Some(TaskError::Interrupted));
        assert_eq!(result.stdout, "early\n");
        assert!(result.duration_ms() < 10_000);
    }

    #[tokio::test]
    async fn test_killed_by_signal() {
        let result = TaskExecutor::new()
            .run(&shell("sig", "kill -9 $$"))
            .await;

        assert_eq!(result.error, Some(TaskError::Terminated { signal: Some(9) }));
    }

    #[tokio::test]
    async fn test_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();

        let result = TaskExecutor::new()
            .with_working_dir(dir.path())
            .run(&shell("cwd", "cat marker.txt"))
            .await;

        assert!(result.is_success());
        assert_eq!(result.stdout, "here");
    }
}
