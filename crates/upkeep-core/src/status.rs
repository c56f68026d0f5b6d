//! Status enums for task attempts and the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one task attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// The command exited with code 0.
    Success,
    /// The command could not be spawned, exited non-zero, or was stopped.
    Failure,
}

impl TaskStatus {
    /// Returns true for a successful attempt.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Lifecycle of a single maintenance run.
///
/// ```text
/// Idle -> Connecting -> Running -> ClosingConnection -> Done
///                  \-> Failed
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// Run not started yet.
    #[default]
    Idle,
    /// Opening the store connection.
    Connecting,
    /// Executing tasks in registry order.
    Running,
    /// Releasing the store connection.
    ClosingConnection,
    /// Every attempted task has a result and the connection is released.
    Done,
    /// The store connection could not be established; no task ran.
    Failed,
}

impl RunState {
    /// Returns true if the run is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (*self, next),
            (Self::Idle, Self::Connecting)
                | (Self::Connecting, Self::Running)
                | (Self::Connecting, Self::Failed)
                | (Self::Running, Self::ClosingConnection)
                | (Self::ClosingConnection, Self::Done)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Running => "running",
            Self::ClosingConnection => "closing_connection",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
