//! Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

/// Upkeep - run backend maintenance jobs against the store
#[derive(Debug, Parser)]
#[command(name = "upkeep")]
#[command(about = "Run backend maintenance jobs against the store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Connect to the store and run every task in order
    Run(RunConfig),

    /// Print the task registry without connecting
    List(ListConfig),
}

/// Configuration for a maintenance run.
#[derive(Debug, Args)]
pub struct RunConfig {
    /// Store connection URI, also passed to each task as STORE_URI
    #[arg(long, env = "STORE_URI", hide_env_values = true)]
    pub store_uri: String,

    /// Seconds to wait for the store connection
    #[arg(long, env = "UPKEEP_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Kill any task running longer than this many seconds
    #[arg(long, env = "UPKEEP_TASK_TIMEOUT_SECS")]
    pub task_timeout_secs: Option<u64>,

    /// Working directory for task processes
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Emit JSON lines instead of human-readable output
    #[arg(long)]
    pub json: bool,
}

impl RunConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_secs.map(Duration::from_secs)
    }
}

/// Configuration for listing tasks.
#[derive(Debug, Args)]
pub struct ListConfig {
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Print the registry as JSON
    #[arg(long)]
    pub json: bool,
}

/// Which tasks a command operates on.
#[derive(Debug, Args)]
pub struct RegistryArgs {
    /// JSON file replacing the built-in task list
    #[arg(long, env = "UPKEEP_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Only run the named task (repeatable); registry order is kept
    #[arg(long = "only", value_name = "TASK")]
    pub only: Vec<String>,
}
