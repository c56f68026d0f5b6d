//! Per-task attempt results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TaskStatus;

/// Why a task attempt failed.
///
/// These are recorded on a [`TaskResult`], never propagated to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskError {
    /// The process could not be started (e.g. program not found).
    #[error("failed to spawn: {reason}")]
    SpawnFailed { reason: String },

    /// The process exited with a non-zero code.
    #[error("exited with code {code}")]
    NonZeroExit { code: i32 },

    /// The process was terminated by a signal and has no exit code.
    #[error("terminated by signal {}", signal_label(.signal))]
    Terminated { signal: Option<i32> },

    /// The process ran past the configured timeout and was killed.
    #[error("timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },

    /// The run was interrupted while this task was executing.
    #[error("interrupted")]
    Interrupted,
}

fn signal_label(signal: &Option<i32>) -> String {
    signal.map_or_else(|| "unknown".to_string(), |s| s.to_string())
}

/// Recorded outcome of one task attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Name of the descriptor this result belongs to.
    pub name: String,

    /// Success or Failure.
    pub status: TaskStatus,

    /// Captured standard output.
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,

    /// Failure detail. Present iff `status` is Failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,

    /// When the attempt started.
    pub started_at: DateTime<Utc>,

    /// When the attempt finished.
    pub finished_at: DateTime<Utc>,
}

impl TaskResult {
    /// Record a successful attempt finishing now.
    pub fn success(
        name: impl Into<String>,
        started_at: DateTime<Utc>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: TaskStatus::Success,
            stdout: stdout.into(),
            stderr: stderr.into(),
            error: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Record a failed attempt finishing now.
    pub fn failure(
        name: impl Into<String>,
        started_at: DateTime<Utc>,
        error: TaskError,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: TaskStatus::Failure,
            stdout: stdout.into(),
            stderr: stderr.into(),
            error: Some(error),
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Returns true if the attempt succeeded.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Wall-clock duration of the attempt in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_error() {
        let result = TaskResult::success("a", Utc::now(), "ok\n", "");
        assert!(result.is_success());
        assert!(result.error.is_none());
        assert!(result.duration_ms() >= 0);
    }

    #[test]
    fn test_failure_carries_error() {
        let result = TaskResult::failure(
            "b",
            Utc::now(),
            TaskError::NonZeroExit { code: 3 },
            "",
            "boom\n",
        );
        assert_eq!(result.status, TaskStatus::Failure);
        assert_eq!(result.error, Some(TaskError::NonZeroExit { code: 3 }));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TaskError::NonZeroExit { code: 1 }.to_string(),
            "exited with code 1"
        );
        assert_eq!(
            TaskError::Terminated { signal: Some(9) }.to_string(),
            "terminated by signal 9"
        );
        assert_eq!(
            TaskError::Terminated { signal: None }.to_string(),
            "terminated by signal unknown"
        );
        assert_eq!(
            TaskError::TimedOut { after_ms: 1500 }.to_string(),
            "timed out after 1500ms"
        );
    }

    #[test]
    fn test_error_json_shape() {
        let json = serde_json::to_value(TaskError::SpawnFailed {
            reason: "not found".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "spawn_failed");
        assert_eq!(json["reason"], "not found");
    }
}
