//! Error types
//!
//! Every fallible library operation returns [`Error`]. Menu and dialog
//! cancellation are not errors; they surface as `None` / `ExportOutcome::Cancelled`.

use std::path::PathBuf;
use thiserror::Error;

use crate::recorder::RecorderState;

#[derive(Error, Debug)]
pub enum Error {
    /// Source enumeration is unsupported or was denied by the host
    #[error("failed to query capture sources: {0}")]
    PlatformQuery(String),

    /// The user or platform refused the capture
    #[error("capture permission denied: {0}")]
    Permission(String),

    /// The requested source is no longer valid
    #[error("capture source unavailable: {0}")]
    Device(String),

    /// A recorder transition was requested from the wrong state
    #[error("cannot {operation} while recorder is {state}")]
    InvalidState {
        operation: &'static str,
        state: RecorderState,
    },

    #[error("failed to write recording to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
