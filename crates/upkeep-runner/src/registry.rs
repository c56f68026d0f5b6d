//! Built-in maintenance tasks and registry loading.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use upkeep_core::{CoreError, TaskCommand, TaskDescriptor, TaskRegistry};

/// Errors building the registry for a run.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read registry file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid registry: {0}")]
    Invalid(#[from] CoreError),
}

/// The maintenance jobs shipped with upkeep, in execution order.
pub fn builtin() -> Result<TaskRegistry, CoreError> {
    TaskRegistry::new(vec![
        TaskDescriptor::new(
            "refresh-prices",
            TaskCommand::new("./jobs/refresh-prices"),
            "Refresh cached market prices",
        ),
        TaskDescriptor::new(
            "generate-reports",
            TaskCommand::new("./jobs/generate-reports"),
            "Regenerate daily summary reports",
        ),
        TaskDescriptor::new(
            "ingest-news",
            TaskCommand::new("./jobs/ingest-news"),
            "Ingest the latest news articles",
        ),
    ])
}

/// Load the registry from `path` (or the built-in list) and apply `only`.
pub fn load(path: Option<&Path>, only: &[String]) -> Result<TaskRegistry, RegistryError> {
    let registry = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let registry = TaskRegistry::from_json(&json)?;
            info!(path = %path.display(), tasks = registry.len(), "Loaded task registry");
            registry
        }
        None => builtin()?,
    };

    if only.is_empty() {
        Ok(registry)
    } else {
        Ok(registry.select(only)?)
    }
}
