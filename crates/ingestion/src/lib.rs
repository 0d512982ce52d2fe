//! # Ingestion
//!
//! Session table ingestion module.
//!
//! Responsibilities:
//! - Read the frame, inertial and pose tables of a session
//! - Parse them into typed streams (`FrameStream`, `SensorStream<3>`)
//! - Report malformed rows with file and line
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::load_session;
//!
//! let config = blueprint.session("advio-08").unwrap();
//! let streams = load_session(&config.inputs)?;
//! println!("{} frames", streams.frames.len());
//! ```

mod error;
mod loader;
mod table;

pub use error::{IngestionError, Result};
pub use loader::load_session;
pub use table::TableReader;
