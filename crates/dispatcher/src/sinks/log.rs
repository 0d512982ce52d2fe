//! LogSink - logs session summary via tracing

use contracts::{AlignedSession, ContractError, SessionManifest, SessionSink};
use tracing::{debug, info, instrument};

/// Sink that only logs what a session would produce
pub struct LogSink {
    name: String,
    sessions: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sessions: 0,
        }
    }

    /// Sessions seen so far
    pub fn sessions(&self) -> u64 {
        self.sessions
    }

    fn log_session_summary(&self, manifest: &SessionManifest, session: &AlignedSession) {
        info!(
            sink = %self.name,
            session = %manifest.session_id,
            samples = manifest.samples,
            window_size = manifest.window_size,
            first_timestamp = session.timestamps.first().copied(),
            last_timestamp = session.timestamps.last().copied(),
            arrays = manifest.arrays.len(),
            frame_diffs = manifest.frame_diffs.len(),
            moves = manifest.moves.len(),
            wide_gaps = session.grid.wide_gaps,
            "AlignedSession received"
        );
        for array in &manifest.arrays {
            debug!(
                sink = %self.name,
                kind = ?array.kind,
                shape = ?array.shape,
                dtype = array.dtype.descr(),
                path = %array.path.display(),
                "planned array"
            );
        }
    }
}

impl SessionSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, manifest, session),
        fields(sink = %self.name, session = %manifest.session_id)
    )]
    async fn write(
        &mut self,
        manifest: &SessionManifest,
        session: &AlignedSession,
    ) -> Result<(), ContractError> {
        self.log_session_summary(manifest, session);
        self.sessions += 1;
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, sessions = self.sessions, "LogSink flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GridSummary, SlidingWindows};
    use std::path::PathBuf;

    fn empty_session() -> (SessionManifest, AlignedSession) {
        let manifest = SessionManifest {
            session_id: "advio-11".into(),
            output_dir: PathBuf::from("out"),
            samples: 0,
            window_size: 4,
            synced_table: PathBuf::from("out/frames_synced.csv"),
            frame_extension: "jpg".to_string(),
            arrays: Vec::new(),
            frame_diffs: Vec::new(),
            moves: Vec::new(),
            tensor_frames: Vec::new(),
            manifest_path: PathBuf::from("out/sync_manifest.json"),
        };
        let session = AlignedSession {
            session_id: "advio-11".into(),
            window_size: 4,
            timestamps: Vec::new(),
            frame_ids: Vec::new(),
            predecessor_frame_id: None,
            inertial_brackets: Vec::new(),
            pose_brackets: Vec::new(),
            inertial_windows: SlidingWindows::with_capacity(4, 0),
            grid: GridSummary::default(),
        };
        (manifest, session)
    }

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let (manifest, session) = empty_session();

        let result = sink.write(&manifest, &session).await;
        assert!(result.is_ok());
        assert_eq!(sink.sessions(), 1);
        assert!(sink.flush().await.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
