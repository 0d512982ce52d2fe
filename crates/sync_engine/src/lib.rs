//! # Sync Engine
//!
//! Offline synchronization of the frame, inertial and pose streams of one
//! capture session.
//!
//! Responsibilities:
//! - Nearest-neighbour resampling of the frame clock
//! - Bracket location in the inertial and pose streams (two-pointer)
//! - Sliding-window packing of inertial history
//! - Length reconciliation of every derived array
//!
//! ## Usage Example
//!
//! ```ignore
//! use sync_engine::SessionSynchronizer;
//!
//! let config = blueprint.session("advio-08").unwrap();
//! let streams = ingestion::load_session(&config.inputs)?;
//!
//! let aligned = SessionSynchronizer::new(&config).run(&streams)?;
//! for record in aligned.records() {
//!     // Handle sample
//! }
//! ```

mod bracket;
mod engine;
mod reconcile;
mod resample;
mod window;

// Re-exports
pub use bracket::{locate_all, locate_bracket, BracketLocator};
pub use engine::SessionSynchronizer;
pub use reconcile::{DerivedArrays, Reconciled, Reconciler};
pub use resample::{grid_summary, resample, resample_indices};
pub use window::pack_windows;

// Re-export contracts types
pub use contracts::{AlignedSession, Bracket, GridSummary, SlidingWindows};
