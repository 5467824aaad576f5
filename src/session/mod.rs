//! Recording session management
//!
//! This module provides the `RecordingSession` abstraction that owns:
//! - The capture host and the selected source
//! - The recorder state machine bound to the acquired stream
//! - The fragment buffer and its reset policy
//! - Exporting the finished recording

mod config;
mod session;
mod stats;

pub use config::{BufferPolicy, SessionConfig};
pub use session::{RecordingSession, DEFAULT_SOURCE_LABEL};
pub use stats::SessionStats;
