//! Task executor for Upkeep.
//!
//! Runs one maintenance task as an external process and turns whatever
//! happens (success, non-zero exit, spawn failure, timeout) into a
//! [`TaskResult`](upkeep_core::TaskResult). Task-level failures are data,
//! never errors.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use upkeep_core::{TaskCommand, TaskDescriptor};
//! use upkeep_exec::TaskExecutor;
//!
//! async fn run() {
//!     let executor = TaskExecutor::new()
//!         .with_env("STORE_URI", "postgres://localhost/app")
//!         .with_timeout(Duration::from_secs(600));
//!
//!     let task = TaskDescriptor::new(
//!         "refresh-prices",
//!         TaskCommand::new("refresh-prices"),
//!         "Refresh cached prices",
//!     );
//!     let result = executor.run(&task).await;
//!     println!("{}: {:?}", result.name, result.status);
//! }
//! ```

mod capture;
mod executor;
mod process_group;

pub use executor::{TaskExecutor, STORE_URI_ENV};
