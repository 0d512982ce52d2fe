//! Dispatcher - applies a session manifest through every configured sink

use tracing::{debug, info, instrument};

use contracts::{
    AlignedSession, ContractError, SessionManifest, SessionSink, SinkConfig, SinkType,
};
use observability::record_session_dispatched;

use crate::error::DispatcherError;
use crate::sinks::{FileSink, LogSink};

/// One sink built from configuration
pub enum ConfiguredSink {
    File(FileSink),
    Log(LogSink),
}

impl SessionSink for ConfiguredSink {
    fn name(&self) -> &str {
        match self {
            Self::File(s) => s.name(),
            Self::Log(s) => s.name(),
        }
    }

    async fn write(
        &mut self,
        manifest: &SessionManifest,
        session: &AlignedSession,
    ) -> Result<(), ContractError> {
        match self {
            Self::File(s) => s.write(manifest, session).await,
            Self::Log(s) => s.write(manifest, session).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            Self::File(s) => s.flush().await,
            Self::Log(s) => s.flush().await,
        }
    }
}

/// Create a sink from configuration
#[instrument(
    name = "dispatcher_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
fn create_sink(config: &SinkConfig) -> Result<ConfiguredSink, DispatcherError> {
    match config.sink_type {
        SinkType::Log => Ok(ConfiguredSink::Log(LogSink::new(&config.name))),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e))?;
            Ok(ConfiguredSink::File(sink))
        }
    }
}

/// Fans one session out to every sink, in configuration order.
///
/// The first failing sink aborts the session; later sinks do not run.
pub struct Dispatcher {
    sinks: Vec<ConfiguredSink>,
}

impl Dispatcher {
    /// Build every configured sink
    pub fn from_configs(configs: &[SinkConfig]) -> Result<Self, DispatcherError> {
        let sinks = configs
            .iter()
            .map(create_sink)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(sinks = sinks.len(), "Dispatcher created");
        Ok(Self { sinks })
    }

    /// A dispatcher that only logs, writing nothing
    pub fn dry_run() -> Self {
        Self::with_sinks(vec![ConfiguredSink::Log(LogSink::new("dry_run"))])
    }

    /// Create a dispatcher with custom sinks (for testing)
    pub fn with_sinks(sinks: Vec<ConfiguredSink>) -> Self {
        Self { sinks }
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Apply `manifest` through every sink
    #[instrument(
        name = "dispatcher_dispatch",
        skip(self, manifest, session),
        fields(session = %manifest.session_id, sinks = self.sinks.len())
    )]
    pub async fn dispatch(
        &mut self,
        manifest: &SessionManifest,
        session: &AlignedSession,
    ) -> Result<(), ContractError> {
        for sink in &mut self.sinks {
            let result = sink.write(manifest, session).await;
            record_session_dispatched(sink.name(), result.is_ok());
            result?;
        }
        info!(samples = manifest.samples, "session dispatched");
        Ok(())
    }

    /// Flush every sink
    pub async fn flush(&mut self) -> Result<(), ContractError> {
        for sink in &mut self.sinks {
            sink.flush().await?;
        }
        Ok(())
    }
}
