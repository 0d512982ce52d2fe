//! Per-session loading

use contracts::{SessionInputs, SessionStreams, StreamKind};
use tracing::{info, instrument};

use crate::error::Result;
use crate::table::TableReader;

/// Load the frame, inertial and pose tables of one session
///
/// Only parsing happens here. Monotonicity is checked by the synchronizer,
/// which knows which stage each stream feeds.
#[instrument(skip(inputs), fields(frames = %inputs.frames_table.display()))]
pub fn load_session(inputs: &SessionInputs) -> Result<SessionStreams> {
    let reader = TableReader::new(inputs.has_headers);

    let frames = reader.read_frames(&inputs.frames_table)?;
    let inertial = reader.read_sensor::<3>(&inputs.inertial_table, StreamKind::Inertial)?;
    let pose = reader.read_sensor::<3>(&inputs.pose_table, StreamKind::Pose)?;

    info!(
        frames = frames.len(),
        inertial = inertial.len(),
        pose = pose.len(),
        "session tables loaded"
    );

    Ok(SessionStreams {
        frames,
        inertial,
        pose,
    })
}
