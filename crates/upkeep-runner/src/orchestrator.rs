//! Orchestrator: connect, run every task in order, always release.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tracing::{error, info, warn};
use upkeep_core::{AbortReason, RunId, RunReport, RunState, TaskError, TaskRegistry};
use upkeep_exec::TaskExecutor;
use upkeep_store::{ConnectionError, ConnectionHandle, ConnectionManager, StoreBackend};

use crate::observer::RunObserver;

/// Drives one maintenance run.
///
/// Tasks run strictly one after another in registry order. A failing task
/// is recorded and the next one still runs. Once connected, the store
/// connection is released exactly once, whether the loop finishes, is
/// interrupted, or panics.
pub struct Orchestrator<'a, B: StoreBackend> {
    registry: &'a TaskRegistry,
    connections: ConnectionManager<B>,
    executor: TaskExecutor,
}

impl<'a, B: StoreBackend> Orchestrator<'a, B> {
    pub fn new(
        registry: &'a TaskRegistry,
        connections: ConnectionManager<B>,
        executor: TaskExecutor,
    ) -> Self {
        Self {
            registry,
            connections,
            executor,
        }
    }

    /// Execute the run and return its report.
    ///
    /// `shutdown` resolving stops the run: the current task is killed and
    /// recorded as interrupted, later tasks are skipped.
    pub async fn run<F>(&self, observer: &mut dyn RunObserver, shutdown: F) -> RunReport
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut report = RunReport::new(RunId::generate());
        info!(run_id = %report.run_id, tasks = self.registry.len(), "Starting maintenance run");

        report.transition(RunState::Connecting);
        if let Err(e) = observer.run_started(&report, self.registry) {
            warn!(error = %e, "Failed to report run start");
        }

        let connected = tokio::select! {
            result = self.connections.connect() => result,
            _ = &mut shutdown => Err(ConnectionError::Interrupted),
        };

        let mut handle = match connected {
            Ok(handle) => handle,
            Err(e) => {
                error!(run_id = %report.run_id, error = %e, "Could not connect to store, no tasks run");
                let mut handle = ConnectionHandle::unopened();
                self.connections.close(&mut handle).await;
                report.fail_connection(e.to_string());
                self.finish(observer, &report);
                return report;
            }
        };

        report.transition(RunState::Running);
        let looped = AssertUnwindSafe(self.run_tasks(&mut report, observer, &mut shutdown))
            .catch_unwind()
            .await;

        report.abort = match looped {
            Ok(Ok(())) => None,
            Ok(Err(reason)) => Some(reason),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(run_id = %report.run_id, panic = %message, "Task loop panicked");
                Some(AbortReason::Unexpected {
                    message: format!("task loop panicked: {}", message),
                })
            }
        };

        report.transition(RunState::ClosingConnection);
        self.connections.close(&mut handle).await;
        report.transition(RunState::Done);

        info!(
            run_id = %report.run_id,
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            aborted = report.abort.is_some(),
            "Maintenance run finished"
        );
        self.finish(observer, &report);
        report
    }

    async fn run_tasks<S>(
        &self,
        report: &mut RunReport,
        observer: &mut dyn RunObserver,
        shutdown: &mut S,
    ) -> Result<(), AbortReason>
    where
        S: Future<Output = ()> + Unpin,
    {
        for descriptor in self.registry {
            observer.task_started(descriptor).map_err(reporting_failed)?;

            let result = self.executor.run_until(descriptor, &mut *shutdown).await;
            let interrupted = result.error == Some(TaskError::Interrupted);

            if !result.is_success() {
                warn!(task = %result.name, error = ?result.error, "Task failed, continuing");
            }

            let reported = observer.task_finished(&result);
            report.record(result);

            if interrupted {
                return Err(AbortReason::Interrupted);
            }
            reported.map_err(reporting_failed)?;
        }
        Ok(())
    }

    fn finish(&self, observer: &mut dyn RunObserver, report: &RunReport) {
        if let Err(e) = observer.run_finished(report) {
            warn!(error = %e, "Failed to report run summary");
        }
    }
}

fn reporting_failed(e: std::io::Error) -> AbortReason {
    error!(error = %e, "Reporting failed, stopping run");
    AbortReason::Unexpected {
        message: format!("reporting failed: {}", e),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
