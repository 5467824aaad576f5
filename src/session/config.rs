use serde::{Deserialize, Serialize};

use crate::config::{Config, ExportConfig};

/// What happens to previously recorded fragments when a new recording starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferPolicy {
    /// Drop old fragments; every saved file holds exactly one recording
    #[default]
    ResetOnStart,
    /// Keep appending; a second recording is saved after the first
    Accumulate,
}

/// Configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "recording-5f0c...")
    pub session_id: String,

    pub buffer_policy: BufferPolicy,

    /// Container/codec tag for exported files
    pub mime_type: String,

    pub export: ExportConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("recording-{}", uuid::Uuid::new_v4()),
            buffer_policy: BufferPolicy::default(),
            mime_type: "video/webm; codecs=vp9".to_string(),
            export: ExportConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            buffer_policy: config.recorder.buffer_policy,
            mime_type: config.recorder.mime_type.clone(),
            export: config.export.clone(),
            ..Self::default()
        }
    }
}
