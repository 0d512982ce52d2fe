//! SessionSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{AlignedSession, ContractError, SessionManifest};

/// Data output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(SessionSink: Send)]
pub trait LocalSessionSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Apply the planned effects of one session
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(
        &mut self,
        manifest: &SessionManifest,
        session: &AlignedSession,
    ) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;
}
