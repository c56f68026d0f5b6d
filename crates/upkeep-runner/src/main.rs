//! Upkeep - backend maintenance runner

use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use upkeep_core::{AbortReason, RunOutcome, TaskRegistry};
use upkeep_exec::TaskExecutor;
use upkeep_store::{redact_uri, ConnectionManager, PgBackend};

mod config;
mod json_output;
mod observer;
mod orchestrator;
mod registry;

use config::{Cli, Commands, ListConfig, RunConfig};
use json_output::JsonObserver;
use observer::{ConsoleObserver, RunObserver};
use orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialize tracing on stderr, stdout carries the run report
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(config) => run(config).await,
        Commands::List(config) => list(config),
    }
}

async fn run(config: RunConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let registry = registry::load(config.registry.registry.as_deref(), &config.registry.only)?;

    info!(
        store = %redact_uri(&config.store_uri),
        tasks = registry.len(),
        task_timeout_secs = ?config.task_timeout_secs,
        "Starting upkeep"
    );

    let connections =
        ConnectionManager::new(PgBackend::new(), &config.store_uri, config.connect_timeout());

    let mut executor = TaskExecutor::new().with_store_uri(connections.uri());
    if let Some(timeout) = config.task_timeout() {
        executor = executor.with_timeout(timeout);
    }
    if let Some(dir) = &config.workdir {
        executor = executor.with_working_dir(dir);
    }

    let orchestrator = Orchestrator::new(&registry, connections, executor);

    let mut observer: Box<dyn RunObserver> = if config.json {
        Box::new(JsonObserver::stdout())
    } else {
        Box::new(ConsoleObserver::stdout())
    };

    let report = orchestrator.run(observer.as_mut(), shutdown_signal()).await;

    Ok(ExitCode::from(exit_code(&report.outcome())))
}

fn list(config: ListConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let registry = registry::load(config.registry.registry.as_deref(), &config.registry.only)?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&registry)?);
    } else {
        print_registry(&registry);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_registry(registry: &TaskRegistry) {
    let width = registry.iter().map(|t| t.name.len()).max().unwrap_or(0);
    for (i, task) in registry.iter().enumerate() {
        println!("{:>2}. {:<width$}  {}", i + 1, task.name, task.description);
        println!("    {:<width$}  $ {}", "", task.command);
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Interrupt received, stopping run"),
        _ = terminate => warn!("Termination requested, stopping run"),
    }
}

/// Process exit status for a finished run.
///
/// A partial failure is distinct from success so schedulers notice it.
fn exit_code(outcome: &RunOutcome) -> u8 {
    match outcome {
        RunOutcome::Succeeded => 0,
        RunOutcome::PartialFailure { .. } => 1,
        RunOutcome::ConnectionFailed => 2,
        RunOutcome::Aborted(AbortReason::Unexpected { .. }) => 3,
        RunOutcome::Aborted(AbortReason::Interrupted) => 130,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&RunOutcome::Succeeded), 0);
        assert_eq!(exit_code(&RunOutcome::PartialFailure { failed: 2 }), 1);
        assert_eq!(exit_code(&RunOutcome::ConnectionFailed), 2);
        assert_eq!(
            exit_code(&RunOutcome::Aborted(AbortReason::Unexpected {
                message: "boom".to_string()
            })),
            3
        );
        assert_eq!(exit_code(&RunOutcome::Aborted(AbortReason::Interrupted)), 130);
    }
}
