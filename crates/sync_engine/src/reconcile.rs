//! Length reconciliation across every derived array of a session.

use contracts::{Bracket, ContractError, SlidingWindows, Stage};

/// Arrays derived from one resampled grid, index-aligned on the grid
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedArrays<const D: usize> {
    pub timestamps: Vec<f64>,
    pub frame_ids: Vec<String>,
    pub inertial: Vec<Bracket<D>>,
    pub pose: Vec<Bracket<D>>,
    pub windows: SlidingWindows<D>,
}

impl<const D: usize> DerivedArrays<D> {
    fn lengths(&self) -> [(&'static str, usize); 5] {
        [
            ("timestamps", self.timestamps.len()),
            ("frame_ids", self.frame_ids.len()),
            ("inertial_brackets", self.inertial.len()),
            ("pose_brackets", self.pose.len()),
            ("inertial_windows", self.windows.len()),
        ]
    }
}

/// Reconciled arrays plus the frame that preceded the first kept sample
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<const D: usize> {
    pub arrays: DerivedArrays<D>,
    pub predecessor_frame_id: Option<String>,
}

impl<const D: usize> Reconciled<D> {
    pub fn len(&self) -> usize {
        self.arrays.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Crops derived arrays to a common length and index correspondence.
///
/// 1. drop `window_size` leading entries from every non-windowed array
/// 2. drop `extra_leading` entries from every array (frame differencing)
/// 3. drop `trailing_trim` entries from the end of every array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciler {
    pub window_size: usize,
    pub extra_leading: usize,
    pub trailing_trim: usize,
}

impl Reconciler {
    pub fn new(window_size: usize, extra_leading: usize, trailing_trim: usize) -> Self {
        Self {
            window_size,
            extra_leading,
            trailing_trim,
        }
    }

    /// # Errors
    /// - `ShapeMismatch` when the inputs break the
    ///   `len(grid arrays) == len(windows) + window_size` relationship, or the
    ///   trimmed arrays disagree in length
    /// - `Range` when nothing is left after trimming
    pub fn reconcile<const D: usize>(
        &self,
        mut arrays: DerivedArrays<D>,
    ) -> Result<Reconciled<D>, ContractError> {
        let n = arrays.timestamps.len();
        let aligned = [
            arrays.frame_ids.len(),
            arrays.inertial.len(),
            arrays.pose.len(),
            arrays.windows.len() + self.window_size,
        ]
        .iter()
        .all(|&len| len == n);
        if !aligned || arrays.windows.window_size() != self.window_size {
            let mut lengths: Vec<(String, usize)> = arrays
                .lengths()
                .iter()
                .map(|(name, len)| (name.to_string(), *len))
                .collect();
            lengths.push(("window_size".to_string(), self.window_size));
            return Err(ContractError::shape_mismatch(Stage::Reconciliation, lengths));
        }

        let leading = (self.window_size + self.extra_leading).min(n);
        let predecessor_frame_id = leading
            .checked_sub(1)
            .and_then(|i| arrays.frame_ids.get(i).cloned());

        arrays.timestamps.drain(..leading);
        arrays.frame_ids.drain(..leading);
        arrays.inertial.drain(..leading);
        arrays.pose.drain(..leading);
        arrays.windows.drop_front(self.extra_leading);

        let keep = arrays.timestamps.len().saturating_sub(self.trailing_trim);
        arrays.timestamps.truncate(keep);
        arrays.frame_ids.truncate(keep);
        arrays.inertial.truncate(keep);
        arrays.pose.truncate(keep);
        arrays.windows.drop_back(self.trailing_trim);

        let lengths = arrays.lengths();
        if lengths.iter().any(|(_, len)| *len != keep) {
            return Err(ContractError::shape_mismatch(Stage::Reconciliation, lengths));
        }
        if keep == 0 {
            return Err(ContractError::range(
                Stage::Reconciliation,
                n,
                self.window_size + self.extra_leading + self.trailing_trim + 1,
            ));
        }

        Ok(Reconciled {
            arrays,
            predecessor_frame_id,
        })
    }
}
