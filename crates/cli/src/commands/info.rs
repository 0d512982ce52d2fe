//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{DatasetBlueprint, FrameSize, SessionConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    root: String,
    sync_settings: SyncInfo,
    sessions: Vec<SessionInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct SyncInfo {
    target_frequency_hz: f64,
    buffer_size: usize,
    trailing_trim: usize,
    inertial_divisors: [f64; 3],
    frame_diff: bool,
    relocate_frames: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame_tensor: Option<FrameSize>,
}

#[derive(Serialize)]
struct SessionInfo {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    paths: Option<SessionConfig>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    params: std::collections::HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &DatasetBlueprint, args: &InfoArgs) -> ConfigInfo {
    let sessions = blueprint
        .sessions()
        .into_iter()
        .map(|s| SessionInfo {
            id: s.session_id.to_string(),
            paths: args.paths.then_some(s),
        })
        .collect();

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                params: s.params.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let sync = &blueprint.sync;
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        root: blueprint.root().display().to_string(),
        sync_settings: SyncInfo {
            target_frequency_hz: sync.target_frequency_hz,
            buffer_size: sync.buffer_size,
            trailing_trim: sync.trailing_trim,
            inertial_divisors: sync.inertial_divisors,
            frame_diff: blueprint.frame_diff.enabled,
            relocate_frames: blueprint.output.relocate_frames,
            frame_tensor: blueprint.frame_tensor.size(),
        },
        sessions,
        sinks,
    }
}

fn print_config_info(blueprint: &DatasetBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 ADVIO Sync Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Dataset
    println!("📍 Dataset");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Root: {}", blueprint.root().display());
    println!("   └─ Frame extension: {}", blueprint.dataset.layout.frame_extension);

    // Sessions
    let sessions = blueprint.sessions();
    println!("\n🎞  Sessions ({})", sessions.len());
    for (i, session) in sessions.iter().enumerate() {
        let is_last = i == sessions.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {}", prefix, session.session_id);

        if args.paths {
            let inputs = &session.inputs;
            println!("   {}  ├─ Frames: {}", child_prefix, inputs.frames_table.display());
            println!("   {}  ├─ Inertial: {}", child_prefix, inputs.inertial_table.display());
            println!("   {}  ├─ Pose: {}", child_prefix, inputs.pose_table.display());
            println!("   {}  └─ Output: {}", child_prefix, session.outputs.dir.display());
        }
    }

    // Sync Settings
    let sync = &blueprint.sync;
    println!("\n⚙️  Sync Settings");
    println!("   ├─ Target frequency: {} Hz", sync.target_frequency_hz);
    println!("   ├─ Buffer size: {}", sync.buffer_size);
    println!("   ├─ Trailing trim: {}", sync.trailing_trim);
    println!("   ├─ Inertial divisors: {:?}", sync.inertial_divisors);
    println!("   ├─ Frame diff: {}", blueprint.frame_diff.enabled);
    println!("   ├─ Relocate frames: {}", blueprint.output.relocate_frames);
    match blueprint.frame_tensor.size() {
        Some(size) => println!("   └─ Frame tensor: {}x{}", size.height, size.width),
        None => println!("   └─ Frame tensor: false"),
    }

    // Sinks
    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{parse_blueprint, ConfigFormat};
    use std::path::PathBuf;

    #[test]
    fn test_info_json_shape() {
        let blueprint = parse_blueprint(
            "[dataset]\nroot = \"/data/advio\"\nsessions = [\"advio-07\"]\n",
            ConfigFormat::Toml,
        )
        .unwrap();
        let args = InfoArgs {
            config: PathBuf::from("advio.toml"),
            json: true,
            paths: true,
            sinks: false,
        };

        let json = serde_json::to_value(build_config_info(&blueprint, &args)).unwrap();
        assert_eq!(json["sessions"][0]["id"], "advio-07");
        assert_eq!(
            json["sessions"][0]["paths"]["inputs"]["pose_table"],
            "/data/advio/advio-07/ground-truth/pose.csv"
        );
        assert_eq!(json["sync_settings"]["buffer_size"], 100);
        assert!(json.get("sinks").is_none());
    }
}
