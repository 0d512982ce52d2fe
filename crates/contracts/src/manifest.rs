//! SessionManifest - planned storage effects of one session
//!
//! Produced by a pure planning step, executed afterwards by a sink.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::SessionId;

/// Which derived array a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayKind {
    PoseBrackets,
    InertialBrackets,
    InertialWindows,
    /// Normalized frames, `(S, H, W, 3)`
    FrameTensor,
}

/// Element type of a `.npy` array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayDtype {
    F64,
    F32,
    I16,
}

impl ArrayDtype {
    /// NumPy `descr` string, little-endian
    pub fn descr(&self) -> &'static str {
        match self {
            ArrayDtype::F64 => "<f8",
            ArrayDtype::F32 => "<f4",
            ArrayDtype::I16 => "<i2",
        }
    }
}

/// One array file to be written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayOutput {
    pub kind: ArrayKind,
    pub path: PathBuf,
    pub shape: Vec<usize>,
    pub dtype: ArrayDtype,
}

/// A frame file relocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMove {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Difference image between two consecutive retained frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDiffJob {
    pub previous: PathBuf,
    pub next: PathBuf,
    pub output: PathBuf,
}

/// Everything one session will write or move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionManifest {
    pub session_id: SessionId,

    /// Directory receiving the session outputs
    pub output_dir: PathBuf,

    /// Common sample count `S`
    pub samples: usize,

    pub window_size: usize,

    /// `(resampled_timestamp, frame_name)` table
    pub synced_table: PathBuf,

    /// Extension used when naming frames in the synced table
    pub frame_extension: String,

    pub arrays: Vec<ArrayOutput>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frame_diffs: Vec<FrameDiffJob>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moves: Vec<FileMove>,

    /// Source frame of every sample, in sample order, when a frame tensor is planned
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tensor_frames: Vec<PathBuf>,

    /// Where this manifest itself is stored
    pub manifest_path: PathBuf,
}

impl SessionManifest {
    pub fn array(&self, kind: ArrayKind) -> Option<&ArrayOutput> {
        self.arrays.iter().find(|a| a.kind == kind)
    }

    /// Every file this manifest creates, manifest itself included
    pub fn written_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.arrays
            .iter()
            .map(|a| &a.path)
            .chain(std::iter::once(&self.synced_table))
            .chain(self.frame_diffs.iter().map(|d| &d.output))
            .chain(std::iter::once(&self.manifest_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_skips_empty_jobs() {
        let manifest = SessionManifest {
            session_id: "advio-01".into(),
            output_dir: PathBuf::from("out"),
            samples: 3,
            window_size: 2,
            synced_table: PathBuf::from("out/frames_synced.csv"),
            frame_extension: "jpg".to_string(),
            arrays: vec![ArrayOutput {
                kind: ArrayKind::PoseBrackets,
                path: PathBuf::from("out/labels.npy"),
                shape: vec![3, 2, 3],
                dtype: ArrayDtype::F64,
            }],
            frame_diffs: Vec::new(),
            moves: Vec::new(),
            tensor_frames: Vec::new(),
            manifest_path: PathBuf::from("out/sync_manifest.json"),
        };

        let json = serde_json::to_string(&manifest).unwrap();
        assert!(!json.contains("moves"));
        assert!(json.contains("\"pose_brackets\""));

        let parsed: SessionManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, manifest);
        assert_eq!(
            parsed.array(ArrayKind::PoseBrackets).unwrap().shape,
            vec![3, 2, 3]
        );
    }

    #[test]
    fn test_dtype_descr() {
        assert_eq!(ArrayDtype::F64.descr(), "<f8");
        assert_eq!(ArrayDtype::F32.descr(), "<f4");
        assert_eq!(ArrayDtype::I16.descr(), "<i2");
    }
}
