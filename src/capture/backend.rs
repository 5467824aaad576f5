use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use super::ffmpeg::FfmpegHost;
use super::replay::ReplayHost;
use super::source::{CaptureSource, SourceKind};
use crate::config::{CaptureBackendKind, CaptureConfig};
use crate::error::{Error, Result};

/// One encoded fragment of container data, in playback order
pub type Fragment = Vec<u8>;

/// Constraints used to request a stream from the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConstraints {
    /// Always false: only video is captured
    pub audio: bool,
    pub video: VideoConstraints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConstraints {
    pub media_source: String,
    pub source_id: String,
}

impl StreamConstraints {
    /// Video-only desktop capture of the given source
    pub fn desktop(source: &CaptureSource) -> Self {
        Self {
            audio: false,
            video: VideoConstraints {
                media_source: "desktop".to_string(),
                source_id: source.id.clone(),
            },
        }
    }
}

/// Encoding pipeline behind a live stream
///
/// Implementations:
/// - ffmpeg: screen grab encoded to WebM/VP9 on a child process
/// - replay: fragments read back from an already encoded file
#[async_trait]
pub trait CaptureBackend: Send {
    /// Start delivering encoded fragments
    ///
    /// The receiver yields fragments in chronological order and closes once
    /// the pipeline has flushed everything after [`CaptureBackend::stop`] or
    /// when the source ends on its own.
    async fn start(&mut self) -> Result<mpsc::Receiver<Fragment>>;

    /// Ask the pipeline to finish; remaining fragments still arrive on the receiver
    async fn stop(&mut self) -> Result<()>;

    fn is_capturing(&self) -> bool;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Host environment that enumerates sources and hands out streams
#[async_trait]
pub trait CaptureHost: Send + Sync {
    /// Enumerate capturable sources of the requested kinds
    async fn list_sources(&self, kinds: &[SourceKind]) -> Result<Vec<CaptureSource>>;

    /// Acquire a live stream for the source named in `constraints`
    async fn acquire(&self, constraints: &StreamConstraints) -> Result<MediaStream>;

    fn name(&self) -> &str;
}

/// Live handle to video from a chosen source
pub struct MediaStream {
    source: CaptureSource,
    backend: Box<dyn CaptureBackend>,
}

impl MediaStream {
    pub fn new(source: CaptureSource, backend: Box<dyn CaptureBackend>) -> Self {
        Self { source, backend }
    }

    pub fn source(&self) -> &CaptureSource {
        &self.source
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub(crate) fn into_backend(self) -> Box<dyn CaptureBackend> {
        self.backend
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("source", &self.source)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Capture host factory
pub struct CaptureHostFactory;

impl CaptureHostFactory {
    /// Create the capture host selected in the configuration
    pub fn create(config: &CaptureConfig) -> Result<Box<dyn CaptureHost>> {
        match config.backend {
            CaptureBackendKind::Ffmpeg => Ok(Box::new(FfmpegHost::new(config.clone()))),
            CaptureBackendKind::Replay => {
                let dir = config.replay_dir.clone().ok_or_else(|| {
                    Error::PlatformQuery("replay backend requires capture.replay_dir".to_string())
                })?;
                Ok(Box::new(ReplayHost::new(
                    dir,
                    config.fragment_bytes,
                    config.timeslice(),
                )))
            }
        }
    }
}
