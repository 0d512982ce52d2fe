//! DatasetBlueprint - Config Loader output
//!
//! Describes the dataset root, the sessions to process, the synchronization
//! parameters and the output routing. [`DatasetBlueprint::sessions`] expands it
//! into one explicit [`SessionConfig`] per session.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{ChannelScale, SessionId};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete dataset configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Where the sessions live
    pub dataset: DatasetConfig,

    /// Resampling / windowing parameters
    #[serde(default)]
    pub sync: SyncConfig,

    /// Optional frame differencing
    #[serde(default)]
    pub frame_diff: FrameDiffConfig,

    /// Optional normalized frame tensor
    #[serde(default)]
    pub frame_tensor: FrameTensorConfig,

    /// Output file names and frame relocation
    #[serde(default)]
    pub output: OutputConfig,

    /// Output routing
    #[serde(default = "default_sinks")]
    pub sinks: Vec<SinkConfig>,
}

/// Dataset location and session list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Directory containing one sub-directory per session
    pub root: PathBuf,

    /// Sessions to process, in order
    pub sessions: Vec<SessionId>,

    /// Per-session file layout, relative to `<root>/<session>`
    #[serde(default)]
    pub layout: SessionLayout,
}

/// Relative paths inside a session directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLayout {
    #[serde(default = "default_frames_table")]
    pub frames_table: PathBuf,

    #[serde(default = "default_inertial_table")]
    pub inertial_table: PathBuf,

    #[serde(default = "default_pose_table")]
    pub pose_table: PathBuf,

    /// Directory holding the extracted frame images
    #[serde(default = "default_frames_dir")]
    pub frames_dir: PathBuf,

    /// Directory receiving the synchronized outputs
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Extension of the extracted frame images
    #[serde(default = "default_frame_extension")]
    pub frame_extension: String,

    /// Whether the input tables start with a header row
    #[serde(default)]
    pub has_headers: bool,
}

impl Default for SessionLayout {
    fn default() -> Self {
        Self {
            frames_table: default_frames_table(),
            inertial_table: default_inertial_table(),
            pose_table: default_pose_table(),
            frames_dir: default_frames_dir(),
            output_dir: default_output_dir(),
            frame_extension: default_frame_extension(),
            has_headers: false,
        }
    }
}

fn default_frames_table() -> PathBuf {
    PathBuf::from("iphone/frames.csv")
}

fn default_inertial_table() -> PathBuf {
    PathBuf::from("iphone/accelerometer.csv")
}

fn default_pose_table() -> PathBuf {
    PathBuf::from("ground-truth/pose.csv")
}

fn default_frames_dir() -> PathBuf {
    PathBuf::from("iphone/frames")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("iphone")
}

fn default_frame_extension() -> String {
    "jpg".to_string()
}

/// Synchronization parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Rate of the resampled grid (Hz), must be > 0
    #[serde(default = "default_target_frequency")]
    pub target_frequency_hz: f64,

    /// Inertial history length per sample, must be > 0
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Samples dropped from the end to absorb frames lost by the extractor
    #[serde(default = "default_trailing_trim")]
    pub trailing_trim: usize,

    /// Per-channel divisors applied to inertial brackets
    #[serde(default = "default_inertial_divisors")]
    pub inertial_divisors: [f64; 3],
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            target_frequency_hz: default_target_frequency(),
            buffer_size: default_buffer_size(),
            trailing_trim: default_trailing_trim(),
            inertial_divisors: default_inertial_divisors(),
        }
    }
}

fn default_target_frequency() -> f64 {
    50.0
}

fn default_buffer_size() -> usize {
    100
}

fn default_trailing_trim() -> usize {
    1
}

fn default_inertial_divisors() -> [f64; 3] {
    *ChannelScale::<3>::inertial().divisors()
}

/// Frame differencing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameDiffConfig {
    /// Write `next - previous` difference images for every retained sample
    #[serde(default)]
    pub enabled: bool,
}

/// Packing of every retained frame into one `(S, H, W, 3)` tensor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameTensorConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Frames must already have this size; they are not resized
    #[serde(default = "default_frame_side")]
    pub height: u32,

    #[serde(default = "default_frame_side")]
    pub width: u32,
}

impl Default for FrameTensorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            height: default_frame_side(),
            width: default_frame_side(),
        }
    }
}

impl FrameTensorConfig {
    pub fn size(&self) -> Option<FrameSize> {
        self.enabled.then_some(FrameSize {
            height: self.height,
            width: self.width,
        })
    }
}

fn default_frame_side() -> u32 {
    224
}

/// Pixel dimensions of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub height: u32,
    pub width: u32,
}

/// Output file names, relative to the session output directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_synced_table")]
    pub synced_table: String,

    #[serde(default = "default_pose_brackets")]
    pub pose_brackets: String,

    #[serde(default = "default_inertial_brackets")]
    pub inertial_brackets: String,

    #[serde(default = "default_inertial_windows")]
    pub inertial_windows: String,

    #[serde(default = "default_manifest")]
    pub manifest: String,

    #[serde(default = "default_frame_tensor")]
    pub frame_tensor: String,

    /// Move each selected frame into a per-timestamp directory
    #[serde(default)]
    pub relocate_frames: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            synced_table: default_synced_table(),
            pose_brackets: default_pose_brackets(),
            inertial_brackets: default_inertial_brackets(),
            inertial_windows: default_inertial_windows(),
            manifest: default_manifest(),
            frame_tensor: default_frame_tensor(),
            relocate_frames: false,
        }
    }
}

fn default_synced_table() -> String {
    "frames_synced.csv".to_string()
}

fn default_pose_brackets() -> String {
    "labels.npy".to_string()
}

fn default_inertial_brackets() -> String {
    "inertials.npy".to_string()
}

fn default_inertial_windows() -> String {
    "inertial_buffer.npy".to_string()
}

fn default_manifest() -> String {
    "sync_manifest.json".to_string()
}

fn default_frame_tensor() -> String {
    "frames.npy".to_string()
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![SinkConfig {
        name: "disk".to_string(),
        sink_type: SinkType::File,
        params: HashMap::new(),
    }]
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log a summary only
    Log,
    /// Write arrays, tables and manifests to disk
    File,
}

/// Input tables of one session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInputs {
    pub frames_table: PathBuf,
    pub inertial_table: PathBuf,
    pub pose_table: PathBuf,
    pub frames_dir: PathBuf,
    pub has_headers: bool,
}

/// Output paths of one session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutputs {
    pub dir: PathBuf,
    pub synced_table: PathBuf,
    pub pose_brackets: PathBuf,
    pub inertial_brackets: PathBuf,
    pub inertial_windows: PathBuf,
    pub frame_tensor: PathBuf,
    pub manifest: PathBuf,
}

/// Fully resolved parameters of one session run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfig {
    pub session_id: SessionId,
    pub buffer_size: usize,
    pub target_frequency: f64,
    pub trailing_trim: usize,
    pub inertial_divisors: [f64; 3],
    pub frame_diff: bool,
    pub relocate_frames: bool,
    /// Pack retained frames into a tensor of this frame size
    pub frame_tensor: Option<FrameSize>,
    pub frame_extension: String,
    pub inputs: SessionInputs,
    pub outputs: SessionOutputs,
}

impl SessionConfig {
    pub fn inertial_scale(&self) -> ChannelScale<3> {
        ChannelScale::new(self.inertial_divisors)
    }

    /// Leading samples dropped on top of the window warm-up
    pub fn extra_leading_trim(&self) -> usize {
        usize::from(self.frame_diff)
    }
}

impl DatasetBlueprint {
    /// Expand every configured session
    pub fn sessions(&self) -> Vec<SessionConfig> {
        self.dataset
            .sessions
            .iter()
            .map(|id| self.session_config(id))
            .collect()
    }

    /// Expand a single session, if it is configured
    pub fn session(&self, id: &str) -> Option<SessionConfig> {
        self.dataset
            .sessions
            .iter()
            .find(|s| *s == id)
            .map(|s| self.session_config(s))
    }

    fn session_config(&self, id: &SessionId) -> SessionConfig {
        let base = self.dataset.root.join(id.as_str());
        let layout = &self.dataset.layout;
        let out_dir = base.join(&layout.output_dir);
        let out = |name: &str| -> PathBuf { out_dir.join(name) };

        SessionConfig {
            session_id: id.clone(),
            buffer_size: self.sync.buffer_size,
            target_frequency: self.sync.target_frequency_hz,
            trailing_trim: self.sync.trailing_trim,
            inertial_divisors: self.sync.inertial_divisors,
            frame_diff: self.frame_diff.enabled,
            relocate_frames: self.output.relocate_frames,
            frame_tensor: self.frame_tensor.size(),
            frame_extension: layout.frame_extension.clone(),
            inputs: SessionInputs {
                frames_table: base.join(&layout.frames_table),
                inertial_table: base.join(&layout.inertial_table),
                pose_table: base.join(&layout.pose_table),
                frames_dir: base.join(&layout.frames_dir),
                has_headers: layout.has_headers,
            },
            outputs: SessionOutputs {
                synced_table: out(&self.output.synced_table),
                pose_brackets: out(&self.output.pose_brackets),
                inertial_brackets: out(&self.output.inertial_brackets),
                inertial_windows: out(&self.output.inertial_windows),
                frame_tensor: out(&self.output.frame_tensor),
                manifest: out(&self.output.manifest),
                dir: out_dir.clone(),
            },
        }
    }

    /// Root directory of the dataset
    pub fn root(&self) -> &Path {
        &self.dataset.root
    }
}
