use tracing::info;

use super::backend::MediaStream;

/// Surface a freshly acquired stream is shown on
pub trait PreviewSurface: Send {
    /// Bind the stream and begin playback
    fn attach(&mut self, stream: &MediaStream);
}

/// Headless preview that only reports what is being shown
#[derive(Debug, Default)]
pub struct LogPreview;

impl PreviewSurface for LogPreview {
    fn attach(&mut self, stream: &MediaStream) {
        info!(
            "Previewing {} via {}",
            stream.source().name,
            stream.backend_name()
        );
    }
}
