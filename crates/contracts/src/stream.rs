//! Raw per-session streams and bracket pairs.
//!
//! Streams are read-only once loaded; every downstream component borrows them.

use std::cmp::Ordering;

use crate::{ContractError, Stage, SyncFailure};

/// Which raw stream of a session a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Frames,
    Inertial,
    Pose,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Frames => "frames",
            StreamKind::Inertial => "inertial",
            StreamKind::Pose => "pose",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two consecutive raw samples surrounding a target timestamp
///
/// `before` was recorded at or before the target, `after` strictly after it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket<const D: usize> {
    pub before: [f64; D],
    pub after: [f64; D],
}

impl<const D: usize> Bracket<D> {
    pub fn new(before: [f64; D], after: [f64; D]) -> Self {
        Self { before, after }
    }

    /// Row-major `(2, D)` values
    pub fn iter_flat(&self) -> impl Iterator<Item = f64> + '_ {
        self.before.iter().chain(self.after.iter()).copied()
    }
}

/// Fail unless `timestamps` is strictly increasing.
///
/// NaN compares as unordered and is reported as a violation too.
pub fn check_strictly_increasing(timestamps: &[f64], stage: Stage) -> Result<(), ContractError> {
    for (index, pair) in timestamps.windows(2).enumerate() {
        let (previous, current) = (pair[0], pair[1]);
        if current.partial_cmp(&previous) != Some(Ordering::Greater) {
            return Err(ContractError::sync(
                stage,
                SyncFailure::NonMonotonic {
                    index: index + 1,
                    previous,
                    current,
                },
            ));
        }
    }
    Ok(())
}

/// Timestamped stream of `D`-channel samples (inertial, pose)
#[derive(Debug, Clone, PartialEq)]
pub struct SensorStream<const D: usize> {
    timestamps: Vec<f64>,
    values: Vec<[f64; D]>,
}

impl<const D: usize> SensorStream<D> {
    /// Build a stream from parallel columns
    pub fn new(timestamps: Vec<f64>, values: Vec<[f64; D]>) -> Result<Self, ContractError> {
        if timestamps.len() != values.len() {
            return Err(ContractError::shape_mismatch(
                Stage::Ingestion,
                [("timestamps", timestamps.len()), ("values", values.len())],
            ));
        }
        Ok(Self { timestamps, values })
    }

    /// Build a stream from `(timestamp, value)` rows
    pub fn from_rows(rows: impl IntoIterator<Item = (f64, [f64; D])>) -> Self {
        let (timestamps, values) = rows.into_iter().unzip();
        Self { timestamps, values }
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn values(&self) -> &[[f64; D]] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn validate_monotonic(&self, stage: Stage) -> Result<(), ContractError> {
        check_strictly_increasing(&self.timestamps, stage)
    }
}

/// Timestamped video frame identifiers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameStream {
    timestamps: Vec<f64>,
    frame_ids: Vec<String>,
}

impl FrameStream {
    pub fn new(timestamps: Vec<f64>, frame_ids: Vec<String>) -> Result<Self, ContractError> {
        if timestamps.len() != frame_ids.len() {
            return Err(ContractError::shape_mismatch(
                Stage::Ingestion,
                [("timestamps", timestamps.len()), ("frame_ids", frame_ids.len())],
            ));
        }
        Ok(Self {
            timestamps,
            frame_ids,
        })
    }

    pub fn from_rows(rows: impl IntoIterator<Item = (f64, String)>) -> Self {
        let (timestamps, frame_ids) = rows.into_iter().unzip();
        Self {
            timestamps,
            frame_ids,
        }
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn frame_ids(&self) -> &[String] {
        &self.frame_ids
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn validate_monotonic(&self, stage: Stage) -> Result<(), ContractError> {
        check_strictly_increasing(&self.timestamps, stage)
    }
}

/// Three-axis stream
pub type Stream3 = SensorStream<3>;

/// Every raw stream recorded during one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStreams {
    pub frames: FrameStream,
    pub inertial: Stream3,
    pub pose: Stream3,
}
