//! Run report: the ordered record of one orchestrator invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RunId, RunState, TaskResult};

/// Why the task loop stopped before attempting every task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
    /// Operator interrupt (Ctrl-C) arrived mid-run.
    Interrupted,
    /// An error outside the executor contract, e.g. a panic in the loop.
    Unexpected { message: String },
}

/// Summary classification of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every task succeeded.
    Succeeded,
    /// All tasks were attempted, some failed.
    PartialFailure { failed: usize },
    /// The store connection was never established.
    ConnectionFailed,
    /// The loop stopped early.
    Aborted(AbortReason),
}

/// Ordered record of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,

    pub started_at: DateTime<Utc>,

    /// Set once the run reaches a terminal state.
    pub finished_at: Option<DateTime<Utc>>,

    /// One entry per attempted task, in registry order.
    pub results: Vec<TaskResult>,

    /// Set only when the run failed to connect. `results` is then empty.
    pub connection_error: Option<String>,

    /// Set when the loop stopped before the last descriptor.
    pub abort: Option<AbortReason>,

    /// Current orchestrator state.
    pub state: RunState,
}

impl RunReport {
    /// Start a new report in the Idle state.
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            results: Vec::new(),
            connection_error: None,
            abort: None,
            state: RunState::Idle,
        }
    }

    /// Move to the next state.
    ///
    /// Illegal transitions are a programming error.
    pub fn transition(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid run state transition: {} -> {}",
            self.state,
            next
        );
        self.state = next;
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
    }

    /// Append a task result.
    pub fn record(&mut self, result: TaskResult) {
        self.results.push(result);
    }

    /// Record a connection failure and move to Failed.
    pub fn fail_connection(&mut self, error: impl Into<String>) {
        self.results.clear();
        self.connection_error = Some(error.into());
        self.transition(RunState::Failed);
    }

    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.succeeded_count()
    }

    /// Classify the run.
    pub fn outcome(&self) -> RunOutcome {
        if self.connection_error.is_some() {
            return RunOutcome::ConnectionFailed;
        }
        if let Some(reason) = &self.abort {
            return RunOutcome::Aborted(reason.clone());
        }
        match self.failed_count() {
            0 => RunOutcome::Succeeded,
            failed => RunOutcome::PartialFailure { failed },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskError;

    fn report_with(results: Vec<TaskResult>) -> RunReport {
        let mut report = RunReport::new(RunId::generate());
        report.transition(RunState::Connecting);
        report.transition(RunState::Running);
        for result in results {
            report.record(result);
        }
        report.transition(RunState::ClosingConnection);
        report.transition(RunState::Done);
        report
    }

    #[test]
    fn test_all_succeeded() {
        let report = report_with(vec![
            TaskResult::success("a", Utc::now(), "", ""),
            TaskResult::success("b", Utc::now(), "", ""),
        ]);
        assert_eq!(report.outcome(), RunOutcome::Succeeded);
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn test_partial_failure() {
        let report = report_with(vec![
            TaskResult::success("a", Utc::now(), "", ""),
            TaskResult::failure("b", Utc::now(), TaskError::NonZeroExit { code: 1 }, "", ""),
        ]);
        assert_eq!(report.outcome(), RunOutcome::PartialFailure { failed: 1 });
        assert_eq!(report.succeeded_count(), 1);
        assert_eq!(report.state, RunState::Done);
    }

    #[test]
    fn test_connection_failure() {
        let mut report = RunReport::new(RunId::generate());
        report.transition(RunState::Connecting);
        report.fail_connection("connection refused");

        assert_eq!(report.outcome(), RunOutcome::ConnectionFailed);
        assert!(report.results.is_empty());
        assert_eq!(report.state, RunState::Failed);
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn test_abort_wins_over_failures() {
        let mut report = report_with(vec![TaskResult::failure(
            "a",
            Utc::now(),
            TaskError::Interrupted,
            "",
            "",
        )]);
        report.abort = Some(AbortReason::Interrupted);
        assert_eq!(report.outcome(), RunOutcome::Aborted(AbortReason::Interrupted));
    }

    #[test]
    fn test_report_json_shape() {
        let report = report_with(vec![TaskResult::success("a", Utc::now(), "hi", "")]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state"], "DONE");
        assert_eq!(json["results"][0]["status"], "SUCCESS");
        assert!(json["connection_error"].is_null());
    }
}
