//! # Dispatcher
//!
//! Persistence of synchronized sessions.
//!
//! Responsibilities:
//! - Plan every storage effect of a session as a pure [`SessionManifest`]
//! - Apply the manifest through the configured sinks
//! - Write `.npy` arrays and the synced frame table via temp-then-rename
//! - Frame differencing and idempotent frame relocation
//! - Optional normalized frame tensor over the retained frames

pub mod dispatcher;
pub mod error;
pub mod frame_diff;
pub mod frame_tensor;
pub mod npy;
pub mod plan;
pub mod sinks;
pub mod staging;

pub use contracts::{SessionManifest, SessionSink};
pub use dispatcher::{ConfiguredSink, Dispatcher};
pub use error::DispatcherError;
pub use frame_diff::FrameDifference;
pub use frame_tensor::FrameTensor;
pub use plan::plan_session;
pub use sinks::{FileSink, FileSinkConfig, LogSink};
