//! # Observability
//!
//! Logging and metrics of a synchronization run.
//!
//! Sessions run inside a `session` span, so every log line below it carries
//! the session id. The counters and histograms in [`metrics`] are only
//! exported when a Prometheus port is configured.
//!
//! ```ignore
//! observability::Telemetry::new(LogFormat::Compact)
//!     .with_filter("info,sync_engine=debug")
//!     .with_prometheus(9000)
//!     .install()?;
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::Subscriber;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};

pub use crate::metrics::{
    record_bytes_written, record_session_dispatched, record_session_failure,
    record_session_metrics, MetricsSummary, RunningStats, SessionMetricsAggregator, StatsSummary,
};

/// Rendering of log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, with source location and thread
    #[default]
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    fn layer<S>(self) -> Box<dyn Layer<S> + Send + Sync + 'static>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        match self {
            Self::Json => fmt::layer()
                .json()
                .with_current_span(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            Self::Pretty => fmt::layer().pretty().boxed(),
            Self::Compact => fmt::layer().compact().with_target(false).boxed(),
        }
    }
}

/// Logging and metrics setup of one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telemetry {
    pub log_format: LogFormat,
    /// Directives used when `RUST_LOG` is unset
    pub default_filter: String,
    pub prometheus_port: Option<u16>,
}

impl Telemetry {
    pub fn new(log_format: LogFormat) -> Self {
        Self {
            log_format,
            default_filter: "info".to_string(),
            prometheus_port: None,
        }
    }

    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.default_filter = directives.into();
        self
    }

    pub fn with_prometheus(mut self, port: impl Into<Option<u16>>) -> Self {
        self.prometheus_port = port.into();
        self
    }

    /// Install the global subscriber and, if a port is set, the Prometheus recorder.
    ///
    /// Fails when called twice in one process.
    pub fn install(self) -> Result<()> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => parse_filter(&self.default_filter)?,
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(self.log_format.layer())
            .try_init()
            .context("a global tracing subscriber is already installed")?;

        if let Some(port) = self.prometheus_port {
            PrometheusBuilder::new()
                .with_http_listener(([0, 0, 0, 0], port))
                .install()
                .with_context(|| format!("cannot serve Prometheus metrics on port {port}"))?;
            tracing::info!(port, "Prometheus exporter listening");
        }

        tracing::debug!(
            log_format = ?self.log_format,
            filter = %self.default_filter,
            "Telemetry installed"
        );
        Ok(())
    }
}

fn parse_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives).with_context(|| format!("invalid log filter '{directives}'"))
}
