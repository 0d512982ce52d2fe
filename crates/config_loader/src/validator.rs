//! Config validation
//!
//! Rules:
//! - at least one session, session ids unique and usable as a directory name
//! - target_frequency_hz finite and > 0
//! - buffer_size > 0
//! - inertial divisors finite and non-zero
//! - frame tensor dimensions > 0 when enabled
//! - sink names unique and non-empty

use std::collections::HashSet;

use contracts::{ContractError, DatasetBlueprint, SessionId};

/// Validate a DatasetBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &DatasetBlueprint) -> Result<(), ContractError> {
    validate_sessions(blueprint)?;
    validate_sync_config(blueprint)?;
    validate_output_names(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// Session list must be non-empty and unique
fn validate_sessions(blueprint: &DatasetBlueprint) -> Result<(), ContractError> {
    if blueprint.dataset.sessions.is_empty() {
        return Err(ContractError::config_validation(
            "dataset.sessions",
            "at least one session is required",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, session) in blueprint.dataset.sessions.iter().enumerate() {
        if let Err(e) = SessionId::parse(session) {
            return Err(ContractError::config_validation(
                format!("dataset.sessions[{idx}]"),
                format!("'{session}': {e}"),
            ));
        }
        if !seen.insert(session.as_str()) {
            return Err(ContractError::config_validation(
                format!("dataset.sessions[{idx}]"),
                format!("duplicate session id '{session}'"),
            ));
        }
    }
    Ok(())
}

/// Resampling and windowing parameters
fn validate_sync_config(blueprint: &DatasetBlueprint) -> Result<(), ContractError> {
    let sync = &blueprint.sync;

    if !sync.target_frequency_hz.is_finite() || sync.target_frequency_hz <= 0.0 {
        return Err(ContractError::config_validation(
            "sync.target_frequency_hz",
            format!(
                "target_frequency_hz must be a finite value > 0, got {}",
                sync.target_frequency_hz
            ),
        ));
    }

    if sync.buffer_size == 0 {
        return Err(ContractError::config_validation(
            "sync.buffer_size",
            "buffer_size must be > 0",
        ));
    }

    for (channel, divisor) in sync.inertial_divisors.iter().enumerate() {
        if !divisor.is_finite() || *divisor == 0.0 {
            return Err(ContractError::config_validation(
                format!("sync.inertial_divisors[{channel}]"),
                format!("divisor must be finite and non-zero, got {divisor}"),
            ));
        }
    }

    let tensor = &blueprint.frame_tensor;
    if tensor.enabled && (tensor.height == 0 || tensor.width == 0) {
        return Err(ContractError::config_validation(
            "frame_tensor",
            format!(
                "frame size must be > 0, got {}x{}",
                tensor.height, tensor.width
            ),
        ));
    }

    Ok(())
}

/// Output names must be distinct, otherwise one array overwrites another
fn validate_output_names(blueprint: &DatasetBlueprint) -> Result<(), ContractError> {
    let output = &blueprint.output;
    let names = [
        ("output.synced_table", &output.synced_table),
        ("output.pose_brackets", &output.pose_brackets),
        ("output.inertial_brackets", &output.inertial_brackets),
        ("output.inertial_windows", &output.inertial_windows),
        ("output.frame_tensor", &output.frame_tensor),
        ("output.manifest", &output.manifest),
    ];

    let mut seen = HashSet::new();
    for (field, name) in names {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(
                field,
                "file name cannot be empty",
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(ContractError::config_validation(
                field,
                format!("duplicate output file name '{name}'"),
            ));
        }
    }
    Ok(())
}

/// Validate sink configuration
fn validate_sinks(blueprint: &DatasetBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                format!("duplicate sink name '{}'", sink.name),
            ));
        }
    }
    Ok(())
}
