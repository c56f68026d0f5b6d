//! Core domain errors.

use thiserror::Error;

/// Core domain errors for Upkeep.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two descriptors share a name.
    #[error("Duplicate task name: {0}")]
    DuplicateTask(String),

    /// Task not found in the registry.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Invalid task descriptor.
    #[error("Invalid task '{name}': {reason}")]
    InvalidTask { name: String, reason: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
