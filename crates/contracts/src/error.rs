//! Layered error definitions
//!
//! Categorized by source: config / table / sync / sink

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Processing stage of a session, used to tag every failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingestion,
    Resampling,
    InertialBracket,
    PoseBracket,
    Windowing,
    Reconciliation,
    FrameDiff,
    FrameTensor,
    Output,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ingestion => "ingestion",
            Stage::Resampling => "resampling",
            Stage::InertialBracket => "inertial_bracket",
            Stage::PoseBracket => "pose_bracket",
            Stage::Windowing => "windowing",
            Stage::Reconciliation => "reconciliation",
            Stage::FrameDiff => "frame_diff",
            Stage::FrameTensor => "frame_tensor",
            Stage::Output => "output",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a reference stream failed to bracket a target timestamp
#[derive(Debug, Clone, PartialEq)]
pub enum SyncFailure {
    /// The reference stream starts after the target (or has drifted past it)
    StartsAfterTarget { target: f64, reference: f64 },
    /// The reference stream ends at or before the target
    NotCovered { target: f64, reference_end: f64 },
    /// Fewer than two reference samples, no bracket can exist
    EmptyReference { target: f64 },
    /// Timestamps decrease or repeat at `index`
    NonMonotonic {
        index: usize,
        previous: f64,
        current: f64,
    },
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncFailure::StartsAfterTarget { target, reference } => write!(
                f,
                "reference sample at {reference} is already past target {target}"
            ),
            SyncFailure::NotCovered {
                target,
                reference_end,
            } => write!(
                f,
                "reference stream ends at {reference_end}, target {target} is not covered"
            ),
            SyncFailure::EmptyReference { target } => {
                write!(f, "reference stream has fewer than 2 samples for target {target}")
            }
            SyncFailure::NonMonotonic {
                index,
                previous,
                current,
            } => write!(
                f,
                "timestamps not strictly increasing at index {index}: {previous} -> {current}"
            ),
        }
    }
}

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Input Errors =====
    /// Delimited table could not be parsed
    #[error("table parse error in '{path}' line {line}: {message}")]
    TableParse {
        path: String,
        line: u64,
        message: String,
    },

    // ===== Sync Errors =====
    /// A reference stream does not bracket a target timestamp
    #[error("sync error during {stage}: {reason}")]
    Sync { stage: Stage, reason: SyncFailure },

    /// Not enough samples for the requested operation
    #[error("range error during {stage}: {available} samples available, {required} required")]
    Range {
        stage: Stage,
        available: usize,
        required: usize,
    },

    /// Derived arrays disagree in length
    #[error("shape mismatch during {stage}: {}", format_lengths(.lengths))]
    ShapeMismatch {
        stage: Stage,
        lengths: Vec<(String, usize)>,
    },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

fn format_lengths(lengths: &[(String, usize)]) -> String {
    lengths
        .iter()
        .map(|(name, len)| format!("{name}={len}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create table parse error
    pub fn table_parse(path: impl Into<String>, line: u64, message: impl Into<String>) -> Self {
        Self::TableParse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create sync error
    pub fn sync(stage: Stage, reason: SyncFailure) -> Self {
        Self::Sync { stage, reason }
    }

    /// Create range error
    pub fn range(stage: Stage, available: usize, required: usize) -> Self {
        Self::Range {
            stage,
            available,
            required,
        }
    }

    /// Create shape mismatch error from named lengths
    pub fn shape_mismatch<S: Into<String>>(
        stage: Stage,
        lengths: impl IntoIterator<Item = (S, usize)>,
    ) -> Self {
        Self::ShapeMismatch {
            stage,
            lengths: lengths
                .into_iter()
                .map(|(name, len)| (name.into(), len))
                .collect(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Stage that raised the error, if it belongs to the session pipeline
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Sync { stage, .. }
            | Self::Range { stage, .. }
            | Self::ShapeMismatch { stage, .. } => Some(*stage),
            Self::TableParse { .. } => Some(Stage::Ingestion),
            Self::SinkWrite { .. } => Some(Stage::Output),
            _ => None,
        }
    }
}
