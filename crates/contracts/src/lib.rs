//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - All streams of one session share the recording clock (seconds, f64)
//! - Timestamps are strictly increasing inside each raw stream
//! - Index `k` of every array in an [`AlignedSession`] refers to the same logical sample

mod blueprint;
mod error;
mod manifest;
mod scale;
mod session;
mod session_id;
mod sink;
mod stream;
mod window;

pub use blueprint::*;
pub use error::*;
pub use manifest::*;
pub use scale::ChannelScale;
pub use session::*;
pub use session_id::{InvalidSessionId, SessionId};
pub use sink::{LocalSessionSink, SessionSink};
pub use stream::*;
pub use window::SlidingWindows;
