use serde::{Deserialize, Serialize};
use std::fmt;

/// Recorder lifecycle: Idle -> Recording -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    /// No recording in progress
    #[default]
    Idle,
    /// Fragments are being collected
    Recording,
    /// Recording finished; the buffer is complete
    Stopped,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecorderState::Idle => f.write_str("idle"),
            RecorderState::Recording => f.write_str("recording"),
            RecorderState::Stopped => f.write_str("stopped"),
        }
    }
}
