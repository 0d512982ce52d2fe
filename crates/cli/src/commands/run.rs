//! `run` command implementation.

use std::future::Future;

use anyhow::{Context, Result};
use contracts::{DatasetBlueprint, SessionConfig};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{default_jobs, Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    // Load and parse configuration
    let blueprint = config_loader::load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let sessions = select_sessions(&blueprint, &args.sessions)?;

    info!(
        root = %blueprint.root().display(),
        sessions = sessions.len(),
        target_frequency_hz = blueprint.sync.target_frequency_hz,
        buffer_size = blueprint.sync.buffer_size,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - outputs are planned and logged, nothing is written");
    }

    let pipeline = Pipeline::new(PipelineConfig {
        sessions,
        sinks: blueprint.sinks.clone(),
        jobs: if args.jobs == 0 {
            default_jobs()
        } else {
            args.jobs
        },
        dry_run: args.dry_run,
    });

    let result = until_shutdown(pipeline.run(), setup_shutdown_signal()).await?;
    let stats = result.context("Pipeline execution failed")?;
    stats.print_summary();

    if stats.failed() > 0 {
        return Err(CliError::SessionsFailed {
            failed: stats.failed(),
            total: stats.total(),
        }
        .into());
    }
    info!(
        sessions = stats.total(),
        samples = stats.metrics.total_samples,
        "Pipeline completed successfully"
    );

    info!("ADVIO Sync finished");
    Ok(())
}

/// Drive `work` unless `shutdown` completes first
async fn until_shutdown<T>(
    work: impl Future<Output = T>,
    shutdown: impl Future<Output = ()>,
) -> Result<T, CliError> {
    tokio::select! {
        output = work => Ok(output),
        _ = shutdown => {
            warn!("Received shutdown signal, sessions without a manifest are incomplete");
            Err(CliError::Interrupted)
        }
    }
}

/// Restrict the configured sessions to `requested`, keeping configuration order
fn select_sessions(
    blueprint: &DatasetBlueprint,
    requested: &[String],
) -> Result<Vec<SessionConfig>, CliError> {
    if requested.is_empty() {
        return Ok(blueprint.sessions());
    }

    if let Some(unknown) = requested
        .iter()
        .find(|id| blueprint.session(id.as_str()).is_none())
    {
        return Err(CliError::unknown_session(unknown.as_str()));
    }

    Ok(blueprint
        .sessions()
        .into_iter()
        .filter(|s| requested.iter().any(|id| s.session_id == *id))
        .collect())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
