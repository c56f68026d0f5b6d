//! Upkeep Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Process spawning
//! - Database
//! - Runtime specifics
//!
//! All types here describe a single maintenance run: what tasks exist,
//! how each attempt ended, and what the run as a whole reports.

pub mod error;
pub mod ids;
pub mod registry;
pub mod report;
pub mod result;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::RunId;
pub use registry::TaskRegistry;
pub use report::{AbortReason, RunOutcome, RunReport};
pub use result::{TaskError, TaskResult};
pub use status::{RunState, TaskStatus};
pub use task::{TaskCommand, TaskDescriptor};
