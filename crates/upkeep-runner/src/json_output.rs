//! JSON-lines reporting for machine consumers.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::json;
use upkeep_core::{RunReport, TaskDescriptor, TaskRegistry, TaskResult};

use crate::observer::RunObserver;

/// JSON event types that can be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonEventType {
    RunStarted,
    TaskStarted,
    TaskCompleted,
    TaskFailed,
    RunFinished,
}

/// A JSON event written as one line.
#[derive(Debug, Clone, Serialize)]
pub struct JsonEvent {
    pub event: JsonEventType,
    pub timestamp: String,
    pub data: serde_json::Value,
}

impl JsonEvent {
    /// Create a new JSON event with the current timestamp.
    pub fn new(event: JsonEventType, data: serde_json::Value) -> Self {
        Self {
            event,
            timestamp: chrono::Utc::now().to_rfc3339(),
            data,
        }
    }
}

/// Emits one JSON object per line for every run event.
pub struct JsonObserver<W: Write> {
    out: W,
}

impl JsonObserver<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: JsonEventType, data: serde_json::Value) -> io::Result<()> {
        let line = serde_json::to_string(&JsonEvent::new(event, data))?;
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }
}

impl<W: Write> RunObserver for JsonObserver<W> {
    fn run_started(&mut self, report: &RunReport, registry: &TaskRegistry) -> io::Result<()> {
        let tasks: Vec<&str> = registry.iter().map(|t| t.name.as_str()).collect();
        self.emit(
            JsonEventType::RunStarted,
            json!({
                "run_id": report.run_id,
                "tasks": tasks,
            }),
        )
    }

    fn task_started(&mut self, task: &TaskDescriptor) -> io::Result<()> {
        self.emit(
            JsonEventType::TaskStarted,
            json!({
                "name": task.name,
                "description": task.description,
                "command": task.command,
            }),
        )
    }

    fn task_finished(&mut self, result: &TaskResult) -> io::Result<()> {
        let event = if result.is_success() {
            JsonEventType::TaskCompleted
        } else {
            JsonEventType::TaskFailed
        };
        self.emit(event, serde_json::to_value(result)?)
    }

    fn run_finished(&mut self, report: &RunReport) -> io::Result<()> {
        self.emit(JsonEventType::RunFinished, serde_json::to_value(report)?)
    }
}
