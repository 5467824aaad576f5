use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recorder::RecorderState;

/// Statistics about a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    pub state: RecorderState,

    /// Label of the selected source, if any
    pub source: Option<String>,

    /// When the latest recording started
    pub started_at: Option<DateTime<Utc>>,

    /// Duration of the latest recording in seconds (so far, if still recording)
    pub duration_secs: f64,

    /// Fragments currently buffered
    pub chunks_count: usize,

    /// Bytes currently buffered
    pub total_bytes: usize,

    /// Recordings stopped during this session
    pub recordings_completed: usize,
}
