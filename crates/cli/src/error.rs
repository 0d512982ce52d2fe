//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// `--session` names a session the configuration does not list
    #[error("Session '{id}' is not listed in the configuration")]
    UnknownSession { id: String },

    /// At least one session aborted
    #[error("{failed} of {total} sessions failed")]
    SessionsFailed { failed: u64, total: u64 },

    /// Ctrl+C or SIGTERM arrived while sessions were still running
    #[error("Interrupted before all sessions finished")]
    Interrupted,
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn unknown_session(id: impl Into<String>) -> Self {
        Self::UnknownSession { id: id.into() }
    }
}
