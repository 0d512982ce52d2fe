//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract snapshots
//! - Table loading -> synchronization -> planning -> disk, on generated sessions
//! - Failure isolation and determinism

#[cfg(test)]
mod fixtures {
    use std::fmt::Write as _;
    use std::fs;
    use std::path::Path;

    use config_loader::{parse_blueprint, ConfigFormat};
    use contracts::DatasetBlueprint;
    use image::{Rgb, RgbImage};

    pub const FRAME_HZ: f64 = 60.0;
    pub const INERTIAL_HZ: f64 = 100.0;
    pub const POSE_HZ: f64 = 200.0;

    /// Session recorded for `seconds`, pose covering only `pose_secs`
    pub struct SessionFixture {
        pub seconds: f64,
        pub pose_secs: f64,
        pub with_frames: bool,
    }

    impl Default for SessionFixture {
        fn default() -> Self {
            Self {
                seconds: 2.0,
                pose_secs: 2.1,
                with_frames: false,
            }
        }
    }

    impl SessionFixture {
        pub fn write(&self, root: &Path, id: &str) {
            let iphone = root.join(id).join("iphone");
            let gt = root.join(id).join("ground-truth");
            fs::create_dir_all(iphone.join("frames")).unwrap();
            fs::create_dir_all(&gt).unwrap();

            let frame_count = (self.seconds * FRAME_HZ) as usize;
            let mut frames = String::new();
            for i in 1..frame_count {
                writeln!(frames, "{},{}", i as f64 / FRAME_HZ, i).unwrap();
                if self.with_frames {
                    let shade = (i % 256) as u8;
                    RgbImage::from_pixel(4, 3, Rgb([shade, 255 - shade, 7]))
                        .save(iphone.join("frames").join(format!("{i}.png")))
                        .unwrap();
                }
            }

            // channel 0 carries the sample index, channels 1/2 are multiples of g
            let mut inertial = String::new();
            for i in 0..=((self.seconds + 0.1) * INERTIAL_HZ) as usize {
                writeln!(
                    inertial,
                    "{},{},{},{}",
                    i as f64 / INERTIAL_HZ,
                    i,
                    9.81,
                    2.0 * 9.81
                )
                .unwrap();
            }

            // x carries the sample index, quaternion columns are ignored
            let mut pose = String::new();
            for i in 0..=(self.pose_secs * POSE_HZ) as usize {
                writeln!(pose, "{},{},0.5,-1.5,1,0,0,0", i as f64 / POSE_HZ, i).unwrap();
            }

            fs::write(iphone.join("frames.csv"), frames).unwrap();
            fs::write(iphone.join("accelerometer.csv"), inertial).unwrap();
            fs::write(gt.join("pose.csv"), pose).unwrap();
        }
    }

    pub fn blueprint(root: &Path, sessions: &[&str], extra: &str) -> DatasetBlueprint {
        let list = sessions
            .iter()
            .map(|s| format!("\"{s}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let toml = format!(
            r#"
[dataset]
root = "{}"
sessions = [{list}]

[dataset.layout]
frame_extension = "png"

[sync]
target_frequency_hz = 50.0
buffer_size = 8
trailing_trim = 1

{extra}
"#,
            root.display()
        );
        parse_blueprint(&toml, ConfigFormat::Toml).unwrap()
    }

    /// `(descr, shape)` of an `.npy` file
    pub fn npy_header(path: &Path) -> (String, Vec<usize>) {
        let buf = fs::read(path).unwrap();
        assert_eq!(&buf[0..6], b"\x93NUMPY");
        let len = u16::from_le_bytes([buf[8], buf[9]]) as usize;
        let text = std::str::from_utf8(&buf[10..10 + len]).unwrap();

        let descr_start = text.find("'descr': '").unwrap() + "'descr': '".len();
        let descr = text[descr_start..].split('\'').next().unwrap().to_string();

        let shape_start = text.find("'shape': (").unwrap() + "'shape': (".len();
        let shape_text = text[shape_start..].split(')').next().unwrap();
        let shape = shape_text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().unwrap())
            .collect();
        (descr, shape)
    }

    /// Payload of an `<f8` file
    pub fn npy_f64(path: &Path) -> Vec<f64> {
        let buf = fs::read(path).unwrap();
        let len = u16::from_le_bytes([buf[8], buf[9]]) as usize;
        buf[10 + len..]
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect()
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{ChannelScale, ConfigVersion, Stage};

    #[test]
    fn test_contracts_compile() {
        let _ = ConfigVersion::V1;
        assert_eq!(ChannelScale::inertial().divisors(), &[1.0, 9.81, 9.81]);
    }

    #[test]
    fn test_stage_names_are_stable() {
        let names: Vec<_> = [
            Stage::Resampling,
            Stage::InertialBracket,
            Stage::PoseBracket,
            Stage::Windowing,
            Stage::Reconciliation,
        ]
        .iter()
        .map(|s| s.as_str())
        .collect();
        assert_eq!(
            names,
            vec![
                "resampling",
                "inertial_bracket",
                "pose_bracket",
                "windowing",
                "reconciliation"
            ]
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::path::Path;
    use std::time::Instant;

    use contracts::{
        AlignedSession, ArrayKind, ContractError, SessionConfig, SessionManifest, SinkConfig,
        Stage, SyncFailure,
    };
    use dispatcher::{plan_session, Dispatcher};
    use observability::SessionMetricsAggregator;
    use sync_engine::SessionSynchronizer;

    use crate::fixtures::{blueprint, npy_f64, npy_header, SessionFixture, INERTIAL_HZ, POSE_HZ};

    async fn run_session(
        config: &SessionConfig,
        sinks: &[SinkConfig],
    ) -> Result<AlignedSession, ContractError> {
        let streams = ingestion::load_session(&config.inputs)?;
        let aligned = SessionSynchronizer::new(config).run(&streams)?;
        let manifest = plan_session(config, &aligned);

        let mut dispatcher =
            Dispatcher::from_configs(sinks).map_err(|e| e.into_contract("test"))?;
        dispatcher.dispatch(&manifest, &aligned).await?;
        dispatcher.flush().await?;
        Ok(aligned)
    }

    /// End-to-end: tables -> SessionSynchronizer -> manifest -> FileSink
    #[tokio::test]
    async fn test_e2e_session_outputs() {
        let dir = tempfile::tempdir().unwrap();
        SessionFixture::default().write(dir.path(), "advio-01");
        let bp = blueprint(dir.path(), &["advio-01"], "");
        let config = bp.session("advio-01").unwrap();

        let samples = run_session(&config, &bp.sinks).await.unwrap().len();
        assert!(samples > 50, "{samples}");

        let out = &config.outputs;
        for (path, expected) in [
            (&out.pose_brackets, vec![samples, 2, 3]),
            (&out.inertial_brackets, vec![samples, 2, 3]),
            (&out.inertial_windows, vec![samples, 8, 2, 3]),
        ] {
            let (_, shape) = npy_header(path);
            assert_eq!(shape, expected, "{}", path.display());
        }
        assert_eq!(npy_header(&out.inertial_windows).0, "<f4");
        assert_eq!(npy_header(&out.pose_brackets).0, "<f8");

        let table = fs::read_to_string(&out.synced_table).unwrap();
        let rows: Vec<&str> = table.lines().collect();
        assert_eq!(rows.len(), samples);
        assert!(rows.iter().all(|r| r.contains(",advio-01_") && r.ends_with(".png")));

        let manifest: SessionManifest =
            serde_json::from_str(&fs::read_to_string(&out.manifest).unwrap()).unwrap();
        assert_eq!(manifest.samples, samples);
        assert_eq!(
            manifest.array(ArrayKind::InertialWindows).unwrap().shape,
            vec![samples, 8, 2, 3]
        );
    }

    /// Every bracket surrounds its resampled timestamp in the raw streams
    #[tokio::test]
    async fn test_brackets_match_raw_streams() {
        let dir = tempfile::tempdir().unwrap();
        SessionFixture::default().write(dir.path(), "advio-02");
        let bp = blueprint(dir.path(), &["advio-02"], "");
        let config = bp.session("advio-02").unwrap();

        run_session(&config, &bp.sinks).await.unwrap();

        let times: Vec<f64> = fs::read_to_string(&config.outputs.synced_table)
            .unwrap()
            .lines()
            .map(|r| r.split(',').next().unwrap().parse().unwrap())
            .collect();
        let pose = npy_f64(&config.outputs.pose_brackets);
        let inertial = npy_f64(&config.outputs.inertial_brackets);

        for (k, t) in times.iter().enumerate() {
            // x of the pose holds the 200 Hz sample index
            let (before, after) = (pose[k * 6], pose[k * 6 + 3]);
            assert_eq!(after, before + 1.0);
            assert!(before / POSE_HZ <= *t && *t < after / POSE_HZ);

            // channel 0 unscaled index, channels 1 and 2 divided by g
            let (before, after) = (inertial[k * 6], inertial[k * 6 + 3]);
            assert!(before / INERTIAL_HZ <= *t && *t < after / INERTIAL_HZ);
            assert!((inertial[k * 6 + 1] - 1.0).abs() < 1e-12);
            assert!((inertial[k * 6 + 2] - 2.0).abs() < 1e-12);
        }
    }

    #[tokio::test]
    async fn test_frame_diff_and_relocation() {
        let dir = tempfile::tempdir().unwrap();
        SessionFixture {
            with_frames: true,
            ..Default::default()
        }
        .write(dir.path(), "advio-03");
        let bp = blueprint(
            dir.path(),
            &["advio-03"],
            "[frame_diff]\nenabled = true\n\n[output]\nrelocate_frames = true\n",
        );
        let config = bp.session("advio-03").unwrap();

        let streams = ingestion::load_session(&config.inputs).unwrap();
        let aligned = SessionSynchronizer::new(&config).run(&streams).unwrap();
        let manifest = plan_session(&config, &aligned);
        assert_eq!(manifest.frame_diffs.len(), aligned.len());

        let mut dispatcher = Dispatcher::from_configs(&bp.sinks).unwrap();
        dispatcher.dispatch(&manifest, &aligned).await.unwrap();

        let frames = &config.inputs.frames_dir;
        for (t, id) in aligned.timestamps.iter().zip(&aligned.frame_ids) {
            let (descr, shape) = npy_header(&frames.join(format!("advio-03_{id}.npy")));
            assert_eq!(descr, "<i2");
            assert_eq!(shape, vec![3, 3, 4]);
            assert!(frames.join(t.to_string()).join(format!("{id}.png")).exists());
            assert!(!frames.join(format!("{id}.png")).exists());
        }

        // re-applying the same manifest is a no-op for diffs and moves
        dispatcher.dispatch(&manifest, &aligned).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_session_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        SessionFixture {
            pose_secs: 1.0,
            ..Default::default()
        }
        .write(dir.path(), "advio-04");
        let bp = blueprint(dir.path(), &["advio-04"], "");
        let config = bp.session("advio-04").unwrap();

        let err = run_session(&config, &bp.sinks).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::PoseBracket));
        assert!(matches!(
            err,
            ContractError::Sync {
                reason: SyncFailure::NotCovered { .. },
                ..
            }
        ));

        let out = &config.outputs;
        assert!(!out.pose_brackets.exists());
        assert!(!out.inertial_brackets.exists());
        assert!(!out.inertial_windows.exists());
        assert!(!out.synced_table.exists());
        assert!(!out.manifest.exists());
    }

    #[tokio::test]
    async fn test_sessions_in_parallel_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let ids = ["advio-05", "advio-06", "advio-07", "advio-08"];
        for (i, id) in ids.iter().enumerate() {
            SessionFixture {
                pose_secs: if i == 2 { 0.5 } else { 2.1 },
                ..Default::default()
            }
            .write(dir.path(), id);
        }
        let bp = blueprint(dir.path(), &ids, "");

        let mut tasks = tokio::task::JoinSet::new();
        for config in bp.sessions() {
            let sinks = bp.sinks.clone();
            tasks.spawn(async move {
                let started = Instant::now();
                let result = run_session(&config, &sinks).await;
                (config.session_id.clone(), result, started.elapsed())
            });
        }

        let mut aggregator = SessionMetricsAggregator::new();
        while let Some(joined) = tasks.join_next().await {
            let (id, result, elapsed) = joined.unwrap();
            match result {
                Ok(aligned) => aggregator.record_success(&aligned, elapsed),
                Err(e) => {
                    assert_eq!(id, "advio-07");
                    aggregator.record_failure(e.stage());
                }
            }
        }

        assert_eq!(aggregator.succeeded, 3);
        assert_eq!(aggregator.failed, 1);
        assert_eq!(aggregator.failures_by_stage.get("pose_bracket"), Some(&1));
        assert!(dir.path().join("advio-08/iphone/labels.npy").exists());
        assert!(!dir.path().join("advio-07/iphone/labels.npy").exists());
    }

    fn output_bytes(root: &Path, id: &str) -> Vec<Vec<u8>> {
        ["labels.npy", "inertials.npy", "inertial_buffer.npy", "frames_synced.csv"]
            .iter()
            .map(|name| fs::read(root.join(id).join("iphone").join(name)).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_outputs_are_byte_identical_across_runs() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        for root in [a.path(), b.path()] {
            SessionFixture::default().write(root, "advio-09");
            let bp = blueprint(root, &["advio-09"], "");
            run_session(&bp.session("advio-09").unwrap(), &bp.sinks)
                .await
                .unwrap();
        }

        assert_eq!(output_bytes(a.path(), "advio-09"), output_bytes(b.path(), "advio-09"));
    }
}
