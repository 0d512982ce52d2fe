//! Pipeline statistics and per-session reports.

use std::time::Duration;

use contracts::{ContractError, SessionId};
use observability::SessionMetricsAggregator;

use super::SessionOutcome;

/// Result of one session worker
#[derive(Debug)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub outcome: Result<SessionOutcome, ContractError>,
    pub elapsed: Duration,
}

/// Statistics from a pipeline run
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Reports in configuration order
    pub sessions: Vec<SessionReport>,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Aggregated session metrics
    pub metrics: SessionMetricsAggregator,
}

impl PipelineStats {
    /// Synchronized samples per second of wall time
    pub fn samples_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.metrics.total_samples as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn failed(&self) -> u64 {
        self.metrics.failed
    }

    pub fn total(&self) -> u64 {
        self.metrics.total_sessions
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Sessions: {}", self.total());
        println!("   ├─ Samples: {}", self.metrics.total_samples);
        println!("   └─ Samples/s: {:.2}", self.samples_per_sec());

        println!("\n📁 Sessions");
        for (i, report) in self.sessions.iter().enumerate() {
            let prefix = if i + 1 == self.sessions.len() {
                "└─"
            } else {
                "├─"
            };
            match &report.outcome {
                Ok(outcome) => println!(
                    "   {} ✓ {} - {} samples, {} files ({:.0} ms)",
                    prefix,
                    report.session_id,
                    outcome.aligned.len(),
                    outcome.files,
                    report.elapsed.as_secs_f64() * 1000.0
                ),
                Err(e) => println!("   {} ✗ {} - {}", prefix, report.session_id, e),
            }
        }

        println!("\n{}", self.metrics.summary());
    }
}
