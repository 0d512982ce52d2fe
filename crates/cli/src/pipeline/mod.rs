//! Pipeline orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{default_jobs, Pipeline, PipelineConfig, SessionOutcome};
pub use stats::{PipelineStats, SessionReport};
