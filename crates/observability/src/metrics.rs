//! Session metrics
//!
//! Prometheus counters/histograms per synchronized session, plus an
//! in-memory aggregator for the end-of-run summary.

use std::collections::BTreeMap;
use std::time::Duration;

use contracts::{AlignedSession, Stage};
use metrics::{counter, gauge, histogram};

/// Record metrics of a successfully synchronized session
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_session_metrics;
///
/// let aligned = synchronizer.run(&streams)?;
/// record_session_metrics(&aligned, started.elapsed());
/// ```
pub fn record_session_metrics(session: &AlignedSession, elapsed: Duration) {
    let id = session.session_id.to_string();

    counter!("advio_sync_sessions_total", "status" => "ok").increment(1);
    counter!("advio_sync_samples_total").increment(session.len() as u64);
    gauge!("advio_sync_session_samples", "session" => id.clone()).set(session.len() as f64);

    histogram!("advio_sync_session_duration_ms").record(elapsed.as_secs_f64() * 1000.0);

    let grid = &session.grid;
    gauge!("advio_sync_grid_wide_gaps", "session" => id.clone()).set(grid.wide_gaps as f64);
    if let Some(mean) = grid.mean_spacing {
        gauge!("advio_sync_grid_mean_spacing_ms", "session" => id).set(mean * 1000.0);
    }
}

/// Record a failed session, labelled with the stage that raised the error
pub fn record_session_failure(stage: Option<Stage>) {
    let stage = stage.map_or("unknown", |s| s.as_str());
    counter!("advio_sync_sessions_total", "status" => "failed", "stage" => stage).increment(1);
}

/// Record one sink application
pub fn record_session_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "advio_sync_sessions_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record bytes written to an output file
pub fn record_bytes_written(kind: &'static str, bytes: u64) {
    counter!("advio_sync_bytes_written_total", "kind" => kind).increment(bytes);
}

/// Session metrics aggregator
///
/// Aggregates per-session results in memory for the run summary.
#[derive(Debug, Clone, Default)]
pub struct SessionMetricsAggregator {
    /// Sessions attempted
    pub total_sessions: u64,

    /// Sessions fully written
    pub succeeded: u64,

    /// Sessions aborted
    pub failed: u64,

    /// Samples over all succeeded sessions
    pub total_samples: u64,

    /// Grid gaps wider than twice the target interval
    pub wide_gaps: u64,

    /// Samples per session
    pub sample_stats: RunningStats,

    /// Mean grid spacing per session (ms)
    pub spacing_stats: RunningStats,

    /// Wall time per session (ms)
    pub duration_stats: RunningStats,

    /// Failures per stage
    pub failures_by_stage: BTreeMap<String, u64>,
}

impl SessionMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, session: &AlignedSession, elapsed: Duration) {
        self.total_sessions += 1;
        self.succeeded += 1;
        self.total_samples += session.len() as u64;
        self.wide_gaps += session.grid.wide_gaps as u64;

        self.sample_stats.push(session.len() as f64);
        if let Some(mean) = session.grid.mean_spacing {
            self.spacing_stats.push(mean * 1000.0);
        }
        self.duration_stats.push(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn record_failure(&mut self, stage: Option<Stage>) {
        self.total_sessions += 1;
        self.failed += 1;
        let key = stage.map_or("unknown", |s| s.as_str()).to_string();
        *self.failures_by_stage.entry(key).or_insert(0) += 1;
    }

    /// Build the summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_sessions: self.total_sessions,
            succeeded: self.succeeded,
            failed: self.failed,
            total_samples: self.total_samples,
            wide_gaps: self.wide_gaps,
            failure_rate: if self.total_sessions > 0 {
                self.failed as f64 / self.total_sessions as f64 * 100.0
            } else {
                0.0
            },
            samples_per_session: StatsSummary::from(&self.sample_stats),
            grid_spacing_ms: StatsSummary::from(&self.spacing_stats),
            duration_ms: StatsSummary::from(&self.duration_stats),
            failures_by_stage: self.failures_by_stage.clone(),
        }
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_sessions: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub total_samples: u64,
    pub wide_gaps: u64,
    pub failure_rate: f64,
    pub samples_per_session: StatsSummary,
    pub grid_spacing_ms: StatsSummary,
    pub duration_ms: StatsSummary,
    pub failures_by_stage: BTreeMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Metrics Summary ===")?;
        writeln!(f, "Sessions: {}", self.total_sessions)?;
        writeln!(f, "Succeeded: {}", self.succeeded)?;
        writeln!(f, "Failed: {} ({:.2}%)", self.failed, self.failure_rate)?;
        writeln!(f, "Total samples: {}", self.total_samples)?;
        writeln!(f, "Samples per session: {}", self.samples_per_session)?;
        writeln!(f, "Grid spacing (ms): {}", self.grid_spacing_ms)?;
        writeln!(f, "Skipped-tick gaps: {}", self.wide_gaps)?;
        writeln!(f, "Duration (ms): {}", self.duration_ms)?;

        if !self.failures_by_stage.is_empty() {
            writeln!(f, "Failures by stage:")?;
            for (stage, count) in &self.failures_by_stage {
                writeln!(f, "  {}: {}", stage, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GridSummary, SlidingWindows};

    fn session(samples: usize, mean_spacing: f64, wide_gaps: usize) -> AlignedSession {
        AlignedSession {
            session_id: "advio-08".into(),
            window_size: 1,
            timestamps: vec![0.0; samples],
            frame_ids: vec![String::new(); samples],
            predecessor_frame_id: None,
            inertial_brackets: Vec::new(),
            pose_brackets: Vec::new(),
            inertial_windows: SlidingWindows::with_capacity(1, 0),
            grid: GridSummary {
                mean_spacing: Some(mean_spacing),
                wide_gaps,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = SessionMetricsAggregator::new();

        aggregator.record_success(&session(100, 0.02, 0), Duration::from_millis(40));
        aggregator.record_success(&session(300, 0.021, 2), Duration::from_millis(60));
        aggregator.record_failure(Some(Stage::PoseBracket));
        aggregator.record_failure(None);

        assert_eq!(aggregator.total_sessions, 4);
        assert_eq!(aggregator.succeeded, 2);
        assert_eq!(aggregator.failed, 2);
        assert_eq!(aggregator.total_samples, 400);
        assert_eq!(aggregator.wide_gaps, 2);
        assert_eq!(aggregator.failures_by_stage.get("pose_bracket"), Some(&1));
        assert_eq!(aggregator.failures_by_stage.get("unknown"), Some(&1));

        let summary = aggregator.summary();
        assert!((summary.samples_per_session.mean - 200.0).abs() < 1e-10);
        assert!((summary.failure_rate - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let summary = MetricsSummary {
            total_sessions: 8,
            succeeded: 7,
            failed: 1,
            total_samples: 70_000,
            wide_gaps: 0,
            failure_rate: 12.5,
            samples_per_session: StatsSummary {
                count: 7,
                min: 9000.0,
                max: 11000.0,
                mean: 10000.0,
                std_dev: 500.0,
            },
            grid_spacing_ms: StatsSummary::default(),
            duration_ms: StatsSummary::default(),
            failures_by_stage: BTreeMap::from([("inertial_bracket".to_string(), 1)]),
        };

        let output = format!("{}", summary);
        assert!(output.contains("Sessions: 8"));
        assert!(output.contains("12.50%"));
        assert!(output.contains("inertial_bracket: 1"));
        assert!(output.contains("Grid spacing (ms): N/A"));
    }
}
