//! AlignedSession - Sync Engine output
//!
//! Every array shares one leading sample dimension after reconciliation.

use serde::{Deserialize, Serialize};

use crate::{Bracket, SessionId, SlidingWindows};

/// Spacing diagnostics of the resampled grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridSummary {
    /// Raw frame count before resampling
    pub source_frames: usize,
    /// Grid length before reconciliation
    pub resampled: usize,
    /// Target spacing (seconds)
    pub target_interval: f64,
    /// Smallest gap between consecutive grid points (seconds)
    pub min_spacing: Option<f64>,
    /// Largest gap between consecutive grid points (seconds)
    pub max_spacing: Option<f64>,
    /// Mean gap (seconds)
    pub mean_spacing: Option<f64>,
    /// Gaps wider than twice the target interval
    pub wide_gaps: usize,
}

/// One output unit, borrowed from an [`AlignedSession`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord<'a> {
    pub timestamp: f64,
    pub frame_id: &'a str,
    pub inertial: &'a Bracket<3>,
    pub pose: &'a Bracket<3>,
    pub inertial_window: &'a [Bracket<3>],
}

/// Fully synchronized session, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSession {
    pub session_id: SessionId,

    /// History length of each inertial window
    pub window_size: usize,

    /// Resampled timestamps (seconds)
    pub timestamps: Vec<f64>,

    /// Original frame identifiers
    pub frame_ids: Vec<String>,

    /// Frame that preceded sample 0 on the grid before trimming
    pub predecessor_frame_id: Option<String>,

    /// Scaled inertial brackets, `(S, 2, 3)`
    pub inertial_brackets: Vec<Bracket<3>>,

    /// Pose brackets, `(S, 2, 3)`
    pub pose_brackets: Vec<Bracket<3>>,

    /// Inertial history, `(S, window_size, 2, 3)`
    pub inertial_windows: SlidingWindows<3>,

    pub grid: GridSummary,
}

impl AlignedSession {
    /// Common sample count `S`
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn record(&self, index: usize) -> Option<SampleRecord<'_>> {
        Some(SampleRecord {
            timestamp: *self.timestamps.get(index)?,
            frame_id: self.frame_ids.get(index)?,
            inertial: self.inertial_brackets.get(index)?,
            pose: self.pose_brackets.get(index)?,
            inertial_window: self.inertial_windows.window(index)?,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = SampleRecord<'_>> {
        (0..self.len()).filter_map(|k| self.record(k))
    }

    /// Length of every derived array, by name
    pub fn lengths(&self) -> [(&'static str, usize); 5] {
        [
            ("timestamps", self.timestamps.len()),
            ("frame_ids", self.frame_ids.len()),
            ("inertial_brackets", self.inertial_brackets.len()),
            ("pose_brackets", self.pose_brackets.len()),
            ("inertial_windows", self.inertial_windows.len()),
        ]
    }

    /// Previous frame of every sample, `None` only for sample 0 without a predecessor
    pub fn previous_frame_ids(&self) -> impl Iterator<Item = Option<&str>> {
        std::iter::once(self.predecessor_frame_id.as_deref())
            .chain(self.frame_ids.iter().map(|id| Some(id.as_str())))
            .take(self.frame_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bracket(v: f64) -> Bracket<3> {
        Bracket::new([v; 3], [v + 1.0; 3])
    }

    fn session() -> AlignedSession {
        let inertial: Vec<_> = (0..4).map(|i| bracket(i as f64)).collect();
        let mut windows = SlidingWindows::with_capacity(2, 2);
        windows.push_window(&inertial[0..2]);
        windows.push_window(&inertial[1..3]);

        AlignedSession {
            session_id: "advio-08".into(),
            window_size: 2,
            timestamps: vec![0.2, 0.4],
            frame_ids: vec!["12".into(), "14".into()],
            predecessor_frame_id: Some("10".into()),
            inertial_brackets: inertial[2..4].to_vec(),
            pose_brackets: vec![bracket(10.0), bracket(11.0)],
            inertial_windows: windows,
            grid: GridSummary::default(),
        }
    }

    #[test]
    fn test_record_joins_arrays_by_index() {
        let s = session();
        let r = s.record(1).unwrap();
        assert_eq!(r.timestamp, 0.4);
        assert_eq!(r.frame_id, "14");
        assert_eq!(*r.pose, bracket(11.0));
        assert_eq!(r.inertial_window, &[bracket(1.0), bracket(2.0)]);
        assert!(s.record(2).is_none());
        assert_eq!(s.records().count(), 2);
    }

    #[test]
    fn test_previous_frame_ids() {
        let mut s = session();
        let prev: Vec<_> = s.previous_frame_ids().collect();
        assert_eq!(prev, vec![Some("10"), Some("12")]);

        s.predecessor_frame_id = None;
        let prev: Vec<_> = s.previous_frame_ids().collect();
        assert_eq!(prev, vec![None, Some("12")]);
    }
}
