//! Nearest-neighbour resampling onto a virtual clock.

use contracts::GridSummary;
use observability::RunningStats;

/// Select source indices approximating a `target_frequency` grid.
///
/// A virtual clock starts at `1 / target_frequency`. Source index `idx`
/// (from 1) is inspected once: if the clock is strictly before
/// `timestamps[idx]`, the closer of `idx - 1` and `idx` is selected and the
/// clock advances by one tick. Ties go to `idx`. Index 0 is never a
/// candidate, so the first tick can only land on index 1 or later.
///
/// A source gap longer than one tick only yields one selection, so ticks are
/// skipped rather than re-evaluated. See [`grid_summary`] to detect it.
///
/// Returns an empty list when the frequency is not a positive finite number.
pub fn resample_indices(timestamps: &[f64], target_frequency: f64) -> Vec<usize> {
    if !(target_frequency.is_finite() && target_frequency > 0.0) {
        return Vec::new();
    }

    let time_unit = 1.0 / target_frequency;
    let mut current = time_unit;
    let mut selected = Vec::with_capacity(estimate_len(timestamps, time_unit));

    for idx in 1..timestamps.len() {
        let (prev, next) = (timestamps[idx - 1], timestamps[idx]);
        if current < next {
            if idx > 1 && (prev - current).abs() < (next - current).abs() {
                selected.push(idx - 1);
            } else {
                selected.push(idx);
            }
            current += time_unit;
        }
    }

    selected
}

/// Resampled timestamp values, drawn verbatim from `timestamps`
pub fn resample(timestamps: &[f64], target_frequency: f64) -> Vec<f64> {
    resample_indices(timestamps, target_frequency)
        .into_iter()
        .map(|i| timestamps[i])
        .collect()
}

fn estimate_len(timestamps: &[f64], time_unit: f64) -> usize {
    match (timestamps.first(), timestamps.last()) {
        (Some(first), Some(last)) if last > first => {
            (((last - first) / time_unit).ceil() as usize).min(timestamps.len())
        }
        _ => 0,
    }
}

/// Spacing diagnostics of a resampled grid
///
/// A gap wider than twice `target_interval` means at least one tick was skipped.
pub fn grid_summary(grid: &[f64], source_frames: usize, target_interval: f64) -> GridSummary {
    let mut stats = RunningStats::default();
    let mut wide_gaps = 0;
    for pair in grid.windows(2) {
        let gap = pair[1] - pair[0];
        if gap > 2.0 * target_interval {
            wide_gaps += 1;
        }
        stats.push(gap);
    }

    let has_gaps = stats.count() > 0;
    GridSummary {
        source_frames,
        resampled: grid.len(),
        target_interval,
        min_spacing: has_gaps.then(|| stats.min()),
        max_spacing: has_gaps.then(|| stats.max()),
        mean_spacing: has_gaps.then(|| stats.mean()),
        wide_gaps,
    }
}
