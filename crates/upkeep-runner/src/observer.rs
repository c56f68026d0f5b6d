//! Human-readable run reporting.

use std::io::{self, Write};

use upkeep_core::{AbortReason, RunReport, TaskDescriptor, TaskRegistry, TaskResult};

/// Receives run progress from the orchestrator.
///
/// A returned error is outside the task contract: the orchestrator stops
/// the loop, still releases the connection, and marks the run aborted.
pub trait RunObserver {
    /// Called once connecting has begun.
    fn run_started(&mut self, _report: &RunReport, _registry: &TaskRegistry) -> io::Result<()> {
        Ok(())
    }

    /// Called before a task's process is spawned.
    fn task_started(&mut self, task: &TaskDescriptor) -> io::Result<()>;

    /// Called with the captured result once a task has finished.
    fn task_finished(&mut self, result: &TaskResult) -> io::Result<()>;

    /// Called once the run has reached a terminal state.
    fn run_finished(&mut self, report: &RunReport) -> io::Result<()>;
}

/// Writes banners, captured output and ✓/✗ lines.
pub struct ConsoleObserver<W: Write> {
    out: W,
}

impl ConsoleObserver<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_block(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.out.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            writeln!(self.out)?;
        }
        Ok(())
    }
}

impl<W: Write> RunObserver for ConsoleObserver<W> {
    fn task_started(&mut self, task: &TaskDescriptor) -> io::Result<()> {
        writeln!(self.out)?;
        if task.description.is_empty() {
            writeln!(self.out, "==> {}", task.name)?;
        } else {
            writeln!(self.out, "==> {}: {}", task.name, task.description)?;
        }
        self.out.flush()
    }

    fn task_finished(&mut self, result: &TaskResult) -> io::Result<()> {
        self.write_block(&result.stdout)?;
        self.write_block(&result.stderr)?;
        match &result.error {
            None => writeln!(self.out, "✓ {}", result.name)?,
            Some(error) => writeln!(self.out, "✗ {}: {}", result.name, error)?,
        }
        self.out.flush()
    }

    fn run_finished(&mut self, report: &RunReport) -> io::Result<()> {
        writeln!(self.out)?;
        if let Some(error) = &report.connection_error {
            writeln!(self.out, "✗ Could not connect to store: {}", error)?;
            writeln!(self.out, "No tasks were run.")?;
            return self.out.flush();
        }
        writeln!(
            self.out,
            "{} succeeded, {} failed",
            report.succeeded_count(),
            report.failed_count()
        )?;
        match &report.abort {
            Some(AbortReason::Interrupted) => {
                writeln!(self.out, "Run interrupted, remaining tasks skipped.")?
            }
            Some(AbortReason::Unexpected { message }) => {
                writeln!(self.out, "Run aborted: {}", message)?
            }
            None => {}
        }
        self.out.flush()
    }
}
