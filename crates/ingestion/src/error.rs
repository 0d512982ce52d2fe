//! Ingestion error types

use std::path::{Path, PathBuf};

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Table file could not be opened
    #[error("failed to open table '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A row could not be read or a field is not a number
    #[error("failed to parse '{}' line {line}: {message}", path.display())]
    ParseFailed {
        path: PathBuf,
        line: u64,
        message: String,
    },

    /// A row has fewer columns than the stream dimension requires
    #[error("'{}' line {line}: expected at least {expected} columns, found {found}", path.display())]
    MissingColumns {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The table contains no data rows
    #[error("table '{}' is empty", path.display())]
    Empty { path: PathBuf },
}

impl IngestionError {
    pub(crate) fn parse_failed(path: &Path, line: u64, message: impl Into<String>) -> Self {
        Self::ParseFailed {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Table the error originates from
    pub fn path(&self) -> &Path {
        match self {
            Self::Open { path, .. }
            | Self::ParseFailed { path, .. }
            | Self::MissingColumns { path, .. }
            | Self::Empty { path } => path,
        }
    }
}

impl From<IngestionError> for ContractError {
    fn from(err: IngestionError) -> Self {
        let path = err.path().display().to_string();
        match &err {
            IngestionError::ParseFailed { line, .. }
            | IngestionError::MissingColumns { line, .. } => {
                ContractError::table_parse(path, *line, err.to_string())
            }
            IngestionError::Open { .. } | IngestionError::Empty { .. } => {
                ContractError::table_parse(path, 0, err.to_string())
            }
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
