//! Per-session synchronizer chaining resampling, bracketing, windowing and
//! reconciliation.

use contracts::{
    AlignedSession, ChannelScale, ContractError, SessionConfig, SessionId, SessionStreams, Stage,
};
use tracing::{debug, info, instrument, warn};

use crate::bracket::locate_all;
use crate::reconcile::{DerivedArrays, Reconciler};
use crate::resample::{grid_summary, resample_indices};
use crate::window::pack_windows;

/// Synchronizes the three streams of one session.
///
/// Pure computation: no I/O, no shared state, deterministic for identical
/// inputs. Any failure aborts the whole session.
#[derive(Debug, Clone)]
pub struct SessionSynchronizer {
    session_id: SessionId,
    target_frequency: f64,
    reconciler: Reconciler,
    inertial_scale: ChannelScale<3>,
    pose_scale: ChannelScale<3>,
}

impl SessionSynchronizer {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            session_id: config.session_id.clone(),
            target_frequency: config.target_frequency,
            reconciler: Reconciler::new(
                config.buffer_size,
                config.extra_leading_trim(),
                config.trailing_trim,
            ),
            inertial_scale: config.inertial_scale(),
            pose_scale: ChannelScale::identity(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn window_size(&self) -> usize {
        self.reconciler.window_size
    }

    /// Run the full chain on already loaded streams
    ///
    /// # Errors
    /// - `Sync` for non-monotonic streams or uncovered targets
    /// - `Range` when the grid is too short for the window
    /// - `ShapeMismatch` when derived arrays disagree after trimming
    #[instrument(name = "sync_session", skip_all, fields(session = %self.session_id))]
    pub fn run(&self, streams: &SessionStreams) -> Result<AlignedSession, ContractError> {
        streams.frames.validate_monotonic(Stage::Resampling)?;
        streams.inertial.validate_monotonic(Stage::InertialBracket)?;
        streams.pose.validate_monotonic(Stage::PoseBracket)?;

        // Resampling
        let source = streams.frames.timestamps();
        let indices = resample_indices(source, self.target_frequency);
        if indices.is_empty() {
            return Err(ContractError::range(Stage::Resampling, source.len(), 2));
        }
        let timestamps: Vec<f64> = indices.iter().map(|&i| source[i]).collect();
        let frame_ids: Vec<String> = indices
            .iter()
            .map(|&i| streams.frames.frame_ids()[i].clone())
            .collect();

        let interval = 1.0 / self.target_frequency;
        let grid = grid_summary(&timestamps, source.len(), interval);
        for pair in timestamps.windows(2) {
            metrics::histogram!("advio_sync_grid_spacing_ms").record((pair[1] - pair[0]) * 1000.0);
        }
        if grid.wide_gaps > 0 {
            warn!(
                wide_gaps = grid.wide_gaps,
                max_spacing = grid.max_spacing,
                target_interval = interval,
                "resampled grid skipped ticks"
            );
        }
        debug!(
            source = grid.source_frames,
            resampled = grid.resampled,
            "frames resampled"
        );

        // Bracketing
        let inertial: Vec<_> = locate_all(&timestamps, &streams.inertial, Stage::InertialBracket)?
            .iter()
            .map(|b| self.inertial_scale.apply_bracket(b))
            .collect();
        let pose: Vec<_> = locate_all(&timestamps, &streams.pose, Stage::PoseBracket)?
            .iter()
            .map(|b| self.pose_scale.apply_bracket(b))
            .collect();

        // Windowing
        let windows = pack_windows(&inertial, self.window_size())?;

        // Reconciliation
        let reconciled = self.reconciler.reconcile(DerivedArrays {
            timestamps,
            frame_ids,
            inertial,
            pose,
            windows,
        })?;
        let arrays = reconciled.arrays;

        info!(samples = arrays.timestamps.len(), "session synchronized");

        Ok(AlignedSession {
            session_id: self.session_id.clone(),
            window_size: self.window_size(),
            timestamps: arrays.timestamps,
            frame_ids: arrays.frame_ids,
            predecessor_frame_id: reconciled.predecessor_frame_id,
            inertial_brackets: arrays.inertial,
            pose_brackets: arrays.pose,
            inertial_windows: arrays.windows,
            grid,
        })
    }
}
