//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{DatasetBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    root: String,
    session_count: usize,
    target_frequency_hz: f64,
    buffer_size: usize,
    frame_diff: bool,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::load_blueprint(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    root: blueprint.root().display().to_string(),
                    session_count: blueprint.dataset.sessions.len(),
                    target_frequency_hz: blueprint.sync.target_frequency_hz,
                    buffer_size: blueprint.sync.buffer_size,
                    frame_diff: blueprint.frame_diff.enabled,
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &DatasetBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - sessions will not be stored".to_string());
    } else if !blueprint.sinks.iter().any(|s| s.sink_type == SinkType::File) {
        warnings.push("No file sink configured - only summaries will be logged".to_string());
    }

    if !blueprint.root().exists() {
        warnings.push(format!(
            "Dataset root '{}' does not exist",
            blueprint.root().display()
        ));
    } else {
        for session in blueprint.sessions() {
            if !session.inputs.frames_table.exists() {
                warnings.push(format!(
                    "Session '{}': frame table '{}' not found",
                    session.session_id,
                    session.inputs.frames_table.display()
                ));
            }
        }
    }

    if blueprint.sync.trailing_trim == 0 {
        warnings.push(
            "sync.trailing_trim is 0 - the last sample may reference a frame the extractor dropped"
                .to_string(),
        );
    }

    if blueprint.output.relocate_frames && blueprint.frame_diff.enabled {
        warnings.push(
            "frame relocation and frame differencing are both enabled - differences are computed before frames move"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Root: {}", summary.root);
            println!("  Sessions: {}", summary.session_count);
            println!("  Target frequency: {} Hz", summary.target_frequency_hz);
            println!("  Buffer size: {}", summary.buffer_size);
            println!("  Frame diff: {}", summary.frame_diff);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(config: PathBuf) -> ValidateArgs {
        ValidateArgs {
            config,
            json: true,
        }
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let result = validate_config(&args(PathBuf::from("/nonexistent/advio.toml")));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("advio.toml");
        std::fs::write(
            &path,
            format!(
                "[dataset]\nroot = \"{}\"\nsessions = [\"advio-01\"]\n\n[[sinks]]\nname = \"summary\"\nsink_type = \"log\"\n",
                dir.path().display()
            ),
        )
        .unwrap();

        let result = validate_config(&args(path));
        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.session_count, 1);
        assert_eq!(summary.buffer_size, 100);

        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("No file sink")));
        assert!(warnings.iter().any(|w| w.contains("advio-01")));
    }

    #[test]
    fn test_invalid_config_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("advio.toml");
        std::fs::write(
            &path,
            "[dataset]\nroot = \"/data\"\nsessions = []\n",
        )
        .unwrap();

        let result = validate_config(&args(path));
        assert!(!result.valid);
        assert!(result.error.is_some());
    }
}
