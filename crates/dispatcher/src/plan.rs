//! Pure planning of the storage effects of one session.
//!
//! Nothing here touches the filesystem; the resulting [`SessionManifest`] is
//! applied afterwards by a sink.

use std::collections::HashSet;
use std::path::PathBuf;

use contracts::{
    AlignedSession, ArrayDtype, ArrayKind, ArrayOutput, FileMove, FrameDiffJob, SessionConfig,
    SessionManifest,
};

/// Build the manifest of every file `aligned` will produce
pub fn plan_session(config: &SessionConfig, aligned: &AlignedSession) -> SessionManifest {
    let samples = aligned.len();
    let window_size = aligned.window_size;
    let outputs = &config.outputs;

    let mut arrays = vec![
        ArrayOutput {
            kind: ArrayKind::PoseBrackets,
            path: outputs.pose_brackets.clone(),
            shape: vec![samples, 2, 3],
            dtype: ArrayDtype::F64,
        },
        ArrayOutput {
            kind: ArrayKind::InertialBrackets,
            path: outputs.inertial_brackets.clone(),
            shape: vec![samples, 2, 3],
            dtype: ArrayDtype::F64,
        },
        ArrayOutput {
            kind: ArrayKind::InertialWindows,
            path: outputs.inertial_windows.clone(),
            shape: vec![samples, window_size, 2, 3],
            dtype: ArrayDtype::F32,
        },
    ];
    if let Some(size) = config.frame_tensor {
        arrays.push(ArrayOutput {
            kind: ArrayKind::FrameTensor,
            path: outputs.frame_tensor.clone(),
            shape: vec![samples, size.height as usize, size.width as usize, 3],
            dtype: ArrayDtype::F32,
        });
    }

    SessionManifest {
        session_id: aligned.session_id.clone(),
        output_dir: outputs.dir.clone(),
        samples,
        window_size,
        synced_table: outputs.synced_table.clone(),
        frame_extension: config.frame_extension.clone(),
        arrays,
        frame_diffs: if config.frame_diff {
            plan_frame_diffs(config, aligned)
        } else {
            Vec::new()
        },
        moves: if config.relocate_frames {
            plan_moves(config, aligned)
        } else {
            Vec::new()
        },
        tensor_frames: if config.frame_tensor.is_some() {
            frame_paths(config, aligned)
        } else {
            Vec::new()
        },
        manifest_path: outputs.manifest.clone(),
    }
}

/// Source path of every retained frame, in sample order
fn frame_paths(config: &SessionConfig, aligned: &AlignedSession) -> Vec<PathBuf> {
    let frames_dir = &config.inputs.frames_dir;
    let ext = &config.frame_extension;
    aligned
        .frame_ids
        .iter()
        .map(|id| frames_dir.join(format!("{id}.{ext}")))
        .collect()
}

fn plan_frame_diffs(config: &SessionConfig, aligned: &AlignedSession) -> Vec<FrameDiffJob> {
    let frames_dir = &config.inputs.frames_dir;
    let ext = &config.frame_extension;

    aligned
        .previous_frame_ids()
        .zip(&aligned.frame_ids)
        .filter_map(|(previous, current)| {
            let previous = previous?;
            Some(FrameDiffJob {
                previous: frames_dir.join(format!("{previous}.{ext}")),
                next: frames_dir.join(format!("{current}.{ext}")),
                output: frames_dir.join(format!("{}_{current}.npy", aligned.session_id)),
            })
        })
        .collect()
}

/// `frames/<id>.<ext>` into `frames/<timestamp>/<id>.<ext>`, once per frame
fn plan_moves(config: &SessionConfig, aligned: &AlignedSession) -> Vec<FileMove> {
    let frames_dir = &config.inputs.frames_dir;
    let ext = &config.frame_extension;
    let mut seen = HashSet::new();

    aligned
        .timestamps
        .iter()
        .zip(&aligned.frame_ids)
        .filter(|&(_, id)| seen.insert(id.as_str()))
        .map(|(ts, id)| {
            let file = format!("{id}.{ext}");
            FileMove {
                from: frames_dir.join(&file),
                to: frames_dir.join(ts.to_string()).join(&file),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        Bracket, FrameSize, GridSummary, SessionInputs, SessionOutputs, SlidingWindows,
    };

    fn config(frame_diff: bool, relocate_frames: bool) -> SessionConfig {
        let base = PathBuf::from("/data/advio-03");
        let out = base.join("iphone");
        SessionConfig {
            session_id: "advio-03".into(),
            buffer_size: 2,
            target_frequency: 50.0,
            trailing_trim: 1,
            inertial_divisors: [1.0, 9.81, 9.81],
            frame_diff,
            relocate_frames,
            frame_tensor: None,
            frame_extension: "jpg".to_string(),
            inputs: SessionInputs {
                frames_table: out.join("frames.csv"),
                inertial_table: out.join("accelerometer.csv"),
                pose_table: base.join("ground-truth/pose.csv"),
                frames_dir: out.join("frames"),
                has_headers: false,
            },
            outputs: SessionOutputs {
                synced_table: out.join("frames_synced.csv"),
                pose_brackets: out.join("labels.npy"),
                inertial_brackets: out.join("inertials.npy"),
                inertial_windows: out.join("inertial_buffer.npy"),
                frame_tensor: out.join("frames.npy"),
                manifest: out.join("sync_manifest.json"),
                dir: out,
            },
        }
    }

    fn aligned(frame_ids: &[&str], predecessor: Option<&str>) -> AlignedSession {
        let n = frame_ids.len();
        let bracket = Bracket::new([0.0; 3], [1.0; 3]);
        let mut windows = SlidingWindows::with_capacity(2, n);
        for _ in 0..n {
            windows.push_window(&[bracket, bracket]);
        }
        AlignedSession {
            session_id: "advio-03".into(),
            window_size: 2,
            timestamps: (0..n).map(|i| 0.04 + i as f64 * 0.02).collect(),
            frame_ids: frame_ids.iter().map(|s| s.to_string()).collect(),
            predecessor_frame_id: predecessor.map(str::to_string),
            inertial_brackets: vec![bracket; n],
            pose_brackets: vec![bracket; n],
            inertial_windows: windows,
            grid: GridSummary::default(),
        }
    }

    #[test]
    fn test_array_shapes() {
        let manifest = plan_session(&config(false, false), &aligned(&["3", "4", "5"], None));

        assert_eq!(manifest.samples, 3);
        let pose = manifest.array(ArrayKind::PoseBrackets).unwrap();
        assert_eq!(pose.shape, vec![3, 2, 3]);
        assert_eq!(pose.dtype, ArrayDtype::F64);
        assert_eq!(pose.path, PathBuf::from("/data/advio-03/iphone/labels.npy"));

        let windows = manifest.array(ArrayKind::InertialWindows).unwrap();
        assert_eq!(windows.shape, vec![3, 2, 2, 3]);
        assert_eq!(windows.dtype, ArrayDtype::F32);

        assert!(manifest.frame_diffs.is_empty());
        assert!(manifest.moves.is_empty());
        assert!(manifest.array(ArrayKind::FrameTensor).is_none());
        assert!(manifest.tensor_frames.is_empty());
    }

    #[test]
    fn test_frame_tensor_follows_samples() {
        let mut cfg = config(false, false);
        cfg.frame_tensor = Some(FrameSize {
            height: 4,
            width: 6,
        });
        let manifest = plan_session(&cfg, &aligned(&["3", "3", "5"], None));

        let tensor = manifest.array(ArrayKind::FrameTensor).unwrap();
        assert_eq!(tensor.shape, vec![3, 4, 6, 3]);
        assert_eq!(tensor.dtype, ArrayDtype::F32);
        assert!(tensor.path.ends_with("iphone/frames.npy"));

        let frames = PathBuf::from("/data/advio-03/iphone/frames");
        assert_eq!(
            manifest.tensor_frames,
            vec![frames.join("3.jpg"), frames.join("3.jpg"), frames.join("5.jpg")]
        );
    }

    #[test]
    fn test_frame_diffs_chain_from_predecessor() {
        let manifest = plan_session(&config(true, false), &aligned(&["3", "4", "5"], Some("2")));
        let frames = PathBuf::from("/data/advio-03/iphone/frames");

        assert_eq!(manifest.frame_diffs.len(), 3);
        let first = &manifest.frame_diffs[0];
        assert_eq!(first.previous, frames.join("2.jpg"));
        assert_eq!(first.next, frames.join("3.jpg"));
        assert_eq!(first.output, frames.join("advio-03_3.npy"));
        assert_eq!(manifest.frame_diffs[2].previous, frames.join("4.jpg"));
    }

    #[test]
    fn test_frame_diff_without_predecessor_skips_first() {
        let manifest = plan_session(&config(true, false), &aligned(&["3", "4"], None));
        assert_eq!(manifest.frame_diffs.len(), 1);
        assert!(manifest.frame_diffs[0].output.ends_with("advio-03_4.npy"));
    }

    #[test]
    fn test_moves_into_timestamp_dirs_once_per_frame() {
        let manifest = plan_session(&config(false, true), &aligned(&["3", "3", "5"], None));
        let frames = PathBuf::from("/data/advio-03/iphone/frames");

        assert_eq!(manifest.moves.len(), 2);
        assert_eq!(manifest.moves[0].from, frames.join("3.jpg"));
        assert_eq!(manifest.moves[0].to, frames.join("0.04").join("3.jpg"));
        assert_eq!(manifest.moves[1].from, frames.join("5.jpg"));
    }

    #[test]
    fn test_planning_is_pure() {
        let cfg = config(true, true);
        let session = aligned(&["7", "8", "9"], Some("6"));
        assert_eq!(plan_session(&cfg, &session), plan_session(&cfg, &session));
    }
}
