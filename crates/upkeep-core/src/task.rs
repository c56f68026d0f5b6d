//! Task descriptor types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// External program invocation: executable plus argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCommand {
    /// Program to execute, resolved through `PATH` when not absolute.
    pub program: String,

    /// Arguments passed verbatim, no shell interpretation.
    #[serde(default)]
    pub args: Vec<String>,
}

impl TaskCommand {
    /// Create a command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Builder method to append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Builder method to append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for TaskCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Immutable definition of one maintenance task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Unique name within a registry.
    pub name: String,

    /// Command to run.
    pub command: TaskCommand,

    /// Human description, informational only.
    #[serde(default)]
    pub description: String,
}

impl TaskDescriptor {
    /// Create a new TaskDescriptor.
    pub fn new(
        name: impl Into<String>,
        command: TaskCommand,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            command,
            description: description.into(),
        }
    }
}
