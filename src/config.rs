use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::session::BufferPolicy;

/// Application configuration
///
/// Every field has a default, so the config file is optional. Environment
/// variables override the file, e.g. `DESK_RECORDER__CAPTURE__FRAMERATE=60`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub recorder: RecorderConfig,
    pub capture: CaptureConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Container/codec tag attached to the finished recording
    pub mime_type: String,
    pub buffer_policy: BufferPolicy,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            mime_type: "video/webm; codecs=vp9".to_string(),
            buffer_policy: BufferPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureBackendKind {
    #[default]
    Ffmpeg,
    Replay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub backend: CaptureBackendKind,

    /// ffmpeg executable
    pub ffmpeg_path: String,

    pub framerate: u32,

    /// X11 display to grab; falls back to $DISPLAY, then ":0"
    pub display: Option<String>,

    /// Directory of pre-encoded files for the replay backend
    pub replay_dir: Option<PathBuf>,

    /// Fragment size used by the replay backend
    pub fragment_bytes: usize,

    /// Interval at which the pipeline delivers fragments
    pub timeslice_ms: u64,

    /// How long ffmpeg gets to finalize the container on stop
    pub stop_grace_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            backend: CaptureBackendKind::Ffmpeg,
            ffmpeg_path: "ffmpeg".to_string(),
            framerate: 30,
            display: None,
            replay_dir: None,
            fragment_bytes: 64 * 1024,
            timeslice_ms: 1000,
            stop_grace_ms: 5000,
        }
    }
}

impl CaptureConfig {
    pub fn timeslice(&self) -> Duration {
        Duration::from_millis(self.timeslice_ms.max(1))
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub fn display(&self) -> String {
        self.display
            .clone()
            .or_else(|| std::env::var("DISPLAY").ok())
            .unwrap_or_else(|| ":0".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub filename_prefix: String,
    pub extension: String,
    pub button_label: String,

    /// Directory the default file name is placed in; current directory if unset
    pub default_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename_prefix: "vid".to_string(),
            extension: "webm".to_string(),
            button_label: "Save video".to_string(),
            default_dir: None,
        }
    }
}

impl Config {
    /// Load `path` (any extension the config crate understands, optional)
    /// layered under `DESK_RECORDER__*` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("DESK_RECORDER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }
}
