//! FileSink - applies a session manifest to disk

use contracts::{
    AlignedSession, ArrayDtype, ArrayKind, ArrayOutput, Bracket, ContractError, FileMove,
    FrameDiffJob, FrameSize, SessionManifest, SessionSink, Stage,
};
use observability::record_bytes_written;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

use crate::error::DispatcherError;
use crate::frame_diff::diff_files;
use crate::frame_tensor::pack_frames;
use crate::npy;
use crate::staging::{write_atomic, StagedFiles};

/// Configuration for FileSink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSinkConfig {
    /// Store the manifest JSON next to the outputs
    pub write_manifest: bool,
    /// Keep frame differences that already exist on disk
    pub skip_existing_diffs: bool,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            write_manifest: true,
            skip_existing_diffs: true,
        }
    }
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            write_manifest: parse_flag(params, "write_manifest", defaults.write_manifest)?,
            skip_existing_diffs: parse_flag(
                params,
                "skip_existing_diffs",
                defaults.skip_existing_diffs,
            )?,
        })
    }
}

fn parse_flag(params: &HashMap<String, String>, key: &str, default: bool) -> Result<bool, String> {
    match params.get(key) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| format!("param '{key}' must be true or false, got '{v}'")),
    }
}

/// What happened to one planned relocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveOutcome {
    Moved,
    AlreadyApplied,
}

/// Sink that writes arrays, the synced table and the manifest to disk
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    created_dirs: HashSet<PathBuf>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> Self {
        Self {
            name: name.into(),
            config,
            created_dirs: HashSet::new(),
        }
    }

    /// Create from sink `params`
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, String> {
        let config = FileSinkConfig::from_params(params)?;
        Ok(Self::new(name, config))
    }

    fn ensure_dir(&mut self, dir: &Path) -> std::io::Result<()> {
        if !self.created_dirs.contains(dir) {
            fs::create_dir_all(dir)?;
            self.created_dirs.insert(dir.to_path_buf());
        }
        Ok(())
    }

    fn apply(
        &mut self,
        manifest: &SessionManifest,
        session: &AlignedSession,
    ) -> Result<(), DispatcherError> {
        if manifest.samples != session.len() {
            return Err(ContractError::shape_mismatch(
                Stage::Output,
                [("manifest_samples", manifest.samples), ("session_samples", session.len())],
            )
            .into());
        }

        self.ensure_dir(&manifest.output_dir)?;

        // 1. Stage arrays and the synced table under temporary names
        let mut staged = StagedFiles::new();
        for array in &manifest.arrays {
            let bytes = encode_array(array, manifest, session)?;
            staged.stage(&array.path, &bytes)?;
            record_bytes_written("array", bytes.len() as u64);
        }
        let table = synced_table(session, &manifest.frame_extension)?;
        staged.stage(&manifest.synced_table, &table)?;
        record_bytes_written("table", table.len() as u64);

        // 2. Frame differences read the frames before any relocation
        let mut diffs_written = 0usize;
        for job in &manifest.frame_diffs {
            if self.apply_frame_diff(job)? {
                diffs_written += 1;
            }
        }

        // 3. Expose outputs
        let committed = staged.commit()?;

        // 4. Relocate frames
        let mut moved = 0usize;
        for mv in &manifest.moves {
            if apply_move(mv)? == MoveOutcome::Moved {
                moved += 1;
            }
        }

        // 5. Manifest last, its presence marks a complete session
        if self.config.write_manifest {
            let json = serde_json::to_vec_pretty(manifest)?;
            write_atomic(&manifest.manifest_path, &json)?;
        }

        info!(
            sink = %self.name,
            session = %manifest.session_id,
            files = committed.len(),
            diffs_written,
            moved,
            "session written"
        );
        Ok(())
    }

    /// Returns `false` when the output already existed and was kept
    fn apply_frame_diff(&self, job: &FrameDiffJob) -> Result<bool, DispatcherError> {
        if self.config.skip_existing_diffs && job.output.exists() {
            debug!(output = %job.output.display(), "frame difference exists, skipping");
            return Ok(false);
        }

        let diff = diff_files(&job.previous, &job.next)?;
        let bytes = npy::encode(&diff.shape(), &diff.data)?;
        write_atomic(&job.output, &bytes)?;
        record_bytes_written("frame_diff", bytes.len() as u64);
        Ok(true)
    }

    fn persist_session(
        &mut self,
        manifest: &SessionManifest,
        session: &AlignedSession,
    ) -> Result<(), ContractError> {
        self.apply(manifest, session).map_err(|e| {
            error!(sink = %self.name, session = %manifest.session_id, error = %e, "Write failed");
            e.into_contract(&self.name)
        })
    }
}

/// Relocate one frame; a destination without a source counts as done
fn apply_move(mv: &FileMove) -> Result<MoveOutcome, DispatcherError> {
    if !mv.from.exists() {
        if mv.to.exists() {
            return Ok(MoveOutcome::AlreadyApplied);
        }
        return Err(DispatcherError::MissingSource {
            path: mv.from.clone(),
        });
    }
    if let Some(parent) = mv.to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(&mv.from, &mv.to)?;
    Ok(MoveOutcome::Moved)
}

fn flatten(brackets: &[Bracket<3>]) -> Vec<f64> {
    brackets.iter().flat_map(Bracket::iter_flat).collect()
}

/// Where a planned frame lives now, following an already applied move
fn resolve_frame(path: &Path, moves: &[FileMove]) -> PathBuf {
    if path.exists() {
        return path.to_path_buf();
    }
    moves
        .iter()
        .find(|mv| mv.from == path && mv.to.exists())
        .map_or_else(|| path.to_path_buf(), |mv| mv.to.clone())
}

fn encode_frame_tensor(
    array: &ArrayOutput,
    manifest: &SessionManifest,
) -> Result<Vec<u8>, DispatcherError> {
    let &[samples, height, width, 3] = array.shape.as_slice() else {
        return Err(ContractError::Other(format!(
            "frame tensor shape must be (S, H, W, 3), got {:?}",
            array.shape
        ))
        .into());
    };
    if manifest.tensor_frames.len() != samples {
        return Err(ContractError::shape_mismatch(
            Stage::FrameTensor,
            [("samples", samples), ("frames", manifest.tensor_frames.len())],
        )
        .into());
    }

    let paths: Vec<PathBuf> = manifest
        .tensor_frames
        .iter()
        .map(|p| resolve_frame(p, &manifest.moves))
        .collect();
    let size = FrameSize {
        height: height as u32,
        width: width as u32,
    };
    let tensor = pack_frames(&paths, size)?;
    Ok(npy::encode(&tensor.shape(), tensor.data())?)
}

fn encode_array(
    array: &ArrayOutput,
    manifest: &SessionManifest,
    session: &AlignedSession,
) -> Result<Vec<u8>, DispatcherError> {
    let values = match array.kind {
        ArrayKind::PoseBrackets => flatten(&session.pose_brackets),
        ArrayKind::InertialBrackets => flatten(&session.inertial_brackets),
        ArrayKind::InertialWindows => flatten(session.inertial_windows.as_flat()),
        ArrayKind::FrameTensor => return encode_frame_tensor(array, manifest),
    };

    let bytes = match array.dtype {
        ArrayDtype::F64 => npy::encode(&array.shape, &values)?,
        ArrayDtype::F32 => {
            let narrowed: Vec<f32> = values.iter().map(|&v| v as f32).collect();
            npy::encode(&array.shape, &narrowed)?
        }
        ArrayDtype::I16 => {
            return Err(ContractError::Other(format!(
                "{:?} cannot be stored as {}",
                array.kind,
                array.dtype.descr()
            ))
            .into())
        }
    };
    Ok(bytes)
}

/// Headerless `(timestamp, session_frame.ext)` rows
fn synced_table(session: &AlignedSession, extension: &str) -> Result<Vec<u8>, DispatcherError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for (ts, frame_id) in session.timestamps.iter().zip(&session.frame_ids) {
        writer.write_record([
            ts.to_string(),
            session.session_id.frame_name(frame_id, extension),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| DispatcherError::Io(e.into_error()))
}

impl SessionSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, manifest, session),
        fields(sink = %self.name, session = %manifest.session_id, samples = manifest.samples)
    )]
    async fn write(
        &mut self,
        manifest: &SessionManifest,
        session: &AlignedSession,
    ) -> Result<(), ContractError> {
        self.persist_session(manifest, session)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
