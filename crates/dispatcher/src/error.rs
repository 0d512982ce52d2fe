//! Dispatcher error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// A planned source file is missing and the effect was not applied before
    #[error("missing source file '{}'", .path.display())]
    MissingSource { path: PathBuf },

    /// Frame image could not be decoded
    #[error("failed to decode frame '{}': {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Synchronized table serialization error
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Manifest serialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Sink write error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Fold into the contract error reported by a sink.
    ///
    /// Contract errors keep their stage, everything else becomes a
    /// `SinkWrite` attributed to `sink_name`.
    pub fn into_contract(self, sink_name: &str) -> ContractError {
        match self {
            Self::Contract(e) => e,
            other => ContractError::sink_write(sink_name, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Stage;

    #[test]
    fn test_contract_error_keeps_stage() {
        let err = DispatcherError::from(ContractError::range(Stage::FrameDiff, 1, 2));
        assert_eq!(err.into_contract("disk").stage(), Some(Stage::FrameDiff));
    }

    #[test]
    fn test_other_errors_become_sink_write() {
        let err = DispatcherError::MissingSource {
            path: PathBuf::from("frames/12.jpg"),
        };
        let contract = err.into_contract("disk");
        assert_eq!(contract.stage(), Some(Stage::Output));
        assert!(contract.to_string().contains("frames/12.jpg"));
    }
}
