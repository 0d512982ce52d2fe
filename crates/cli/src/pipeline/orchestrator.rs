//! Pipeline orchestrator - runs every session on its own worker.
//!
//! Sessions share nothing: each worker loads, synchronizes, plans and
//! dispatches one session, and a failure stays inside that session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{AlignedSession, ContractError, SessionConfig, SessionId, SinkConfig};
use dispatcher::{plan_session, Dispatcher};
use observability::{record_session_failure, record_session_metrics};
use sync_engine::SessionSynchronizer;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{error, info, instrument, warn, Instrument};

use super::{PipelineStats, SessionReport};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sessions to process, in report order
    pub sessions: Vec<SessionConfig>,

    /// Output routing
    pub sinks: Vec<SinkConfig>,

    /// Maximum concurrent sessions
    pub jobs: usize,

    /// Route every manifest to a log-only sink
    pub dry_run: bool,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every session to completion
    ///
    /// Only setup problems are returned as errors; session failures are
    /// reported in [`PipelineStats`].
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let jobs = self.config.jobs.max(1);

        // Surface sink misconfiguration before any session starts
        if !self.config.dry_run {
            let dispatcher = Dispatcher::from_configs(&self.config.sinks)
                .context("Failed to create dispatcher")?;
            if dispatcher.sink_names().is_empty() {
                warn!("No sinks configured - sessions will be computed but not stored");
            }
        }

        info!(
            sessions = self.config.sessions.len(),
            jobs,
            dry_run = self.config.dry_run,
            "Starting sessions"
        );

        let permits = Arc::new(Semaphore::new(jobs));
        let mut tasks = JoinSet::new();
        let mut spawned = HashMap::new();
        for (order, session) in self.config.sessions.iter().cloned().enumerate() {
            let permits = Arc::clone(&permits);
            let sinks = self.config.sinks.clone();
            let dry_run = self.config.dry_run;
            let span = tracing::info_span!("session", session = %session.session_id);
            let session_id = session.session_id.clone();

            let handle = tasks.spawn(
                async move {
                    let _permit = permits.acquire_owned().await;
                    let started = Instant::now();
                    let session_id = session.session_id.clone();
                    let outcome = process_session(session, &sinks, dry_run).await;
                    (
                        order,
                        SessionReport {
                            session_id,
                            outcome,
                            elapsed: started.elapsed(),
                        },
                    )
                }
                .instrument(span),
            );
            spawned.insert(handle.id(), (order, session_id));
        }

        let reports = collect_reports(tasks, spawned).await;

        let mut stats = PipelineStats::default();
        for (_, report) in reports {
            record_report(&mut stats, report);
        }
        stats.duration = start_time.elapsed();

        info!(
            succeeded = stats.metrics.succeeded,
            failed = stats.metrics.failed,
            duration_secs = stats.duration.as_secs_f64(),
            "All sessions finished"
        );

        Ok(stats)
    }
}

/// Join every worker, in configuration order.
///
/// A worker that panicked still yields a failed report for its session.
async fn collect_reports(
    mut tasks: JoinSet<(usize, SessionReport)>,
    mut spawned: HashMap<task::Id, (usize, SessionId)>,
) -> Vec<(usize, SessionReport)> {
    let mut reports = Vec::with_capacity(spawned.len());
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, report)) => reports.push(report),
            Err(e) => {
                let Some((order, session_id)) = spawned.remove(&e.id()) else {
                    error!(error = %e, "Unknown session worker failed");
                    continue;
                };
                error!(
                    session = %session_id,
                    error = %e,
                    "Session worker panicked or was cancelled"
                );
                reports.push((
                    order,
                    SessionReport {
                        session_id,
                        outcome: Err(ContractError::Other(format!("session worker failed: {e}"))),
                        elapsed: Duration::ZERO,
                    },
                ));
            }
        }
    }
    reports.sort_by_key(|(order, _)| *order);
    reports
}

/// Summary of a session that was fully written
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub aligned: AlignedSession,
    pub files: usize,
}

fn record_report(stats: &mut PipelineStats, report: SessionReport) {
    match &report.outcome {
        Ok(outcome) => {
            record_session_metrics(&outcome.aligned, report.elapsed);
            stats.metrics.record_success(&outcome.aligned, report.elapsed);
            info!(
                session = %report.session_id,
                samples = outcome.aligned.len(),
                files = outcome.files,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Session complete"
            );
        }
        Err(e) => {
            record_session_failure(e.stage());
            stats.metrics.record_failure(e.stage());
            error!(
                session = %report.session_id,
                stage = e.stage().map(|s| s.as_str()),
                error = %e,
                "Session failed, nothing written"
            );
        }
    }
    stats.sessions.push(report);
}

/// Load, synchronize, plan and dispatch one session
#[instrument(name = "process_session", skip_all)]
async fn process_session(
    config: SessionConfig,
    sinks: &[SinkConfig],
    dry_run: bool,
) -> Result<SessionOutcome, ContractError> {
    // The computation never suspends, keep it off the async workers
    let (config, aligned) = tokio::task::spawn_blocking(move || {
        let streams = ingestion::load_session(&config.inputs)?;
        let aligned = SessionSynchronizer::new(&config).run(&streams)?;
        Ok::<_, ContractError>((config, aligned))
    })
    .await
    .map_err(|e| ContractError::Other(format!("session worker failed: {e}")))??;

    let manifest = plan_session(&config, &aligned);

    let mut dispatcher = if dry_run {
        Dispatcher::dry_run()
    } else {
        Dispatcher::from_configs(sinks).map_err(|e| e.into_contract("dispatcher"))?
    };
    dispatcher.dispatch(&manifest, &aligned).await?;
    dispatcher.flush().await?;

    let files = if dry_run {
        0
    } else {
        manifest.written_paths().count()
    };
    Ok(SessionOutcome { aligned, files })
}

/// Default concurrency, one session per CPU
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
