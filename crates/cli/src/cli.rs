//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ADVIO Sync - offline synchronization of video, inertial and pose streams
#[derive(Parser, Debug)]
#[command(
    name = "advio-sync",
    author,
    version,
    about = "Offline frame / inertial / pose stream synchronizer",
    long_about = "Resamples the video frame clock of every configured session to a fixed \n\
                  rate, brackets each resampled timestamp in the inertial and pose streams, \n\
                  packs inertial history windows and writes index-aligned arrays to disk."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ADVIO_SYNC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ADVIO_SYNC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Level used when RUST_LOG is unset
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Prometheus port requested by the command, if any
    pub fn metrics_port(&self) -> Option<u16> {
        match &self.command {
            Commands::Run(args) if args.metrics_port != 0 => Some(args.metrics_port),
            _ => None,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronize the configured sessions
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "ADVIO_SYNC_CONFIG"
    )]
    pub config: PathBuf,

    /// Only process these sessions (repeatable, must be configured)
    #[arg(short, long = "session", value_name = "ID")]
    pub sessions: Vec<String>,

    /// Maximum number of sessions processed concurrently (0 = number of CPUs)
    #[arg(short, long, default_value = "0", env = "ADVIO_SYNC_JOBS")]
    pub jobs: usize,

    /// Compute everything but only log the planned outputs
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "ADVIO_SYNC_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml", env = "ADVIO_SYNC_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "ADVIO_SYNC_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the resolved input and output paths of every session
    #[arg(long)]
    pub paths: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args() {
        let cli = Cli::parse_from([
            "advio-sync",
            "-v",
            "run",
            "--config",
            "advio.toml",
            "--session",
            "advio-01",
            "-s",
            "advio-02",
            "--jobs",
            "4",
            "--dry-run",
        ]);

        assert_eq!(cli.log_level(), "debug");
        assert_eq!(cli.metrics_port(), None);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("advio.toml"));
                assert_eq!(args.sessions, vec!["advio-01", "advio-02"]);
                assert_eq!(args.jobs, 4);
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_and_metrics_port() {
        let cli = Cli::parse_from(["advio-sync", "-q", "run", "--metrics-port", "9100"]);
        assert_eq!(cli.log_level(), "warn");
        assert_eq!(cli.metrics_port(), Some(9100));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["advio-sync", "-q", "-v", "validate"]).is_err());
    }
}
