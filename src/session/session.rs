use super::config::{BufferPolicy, SessionConfig};
use super::stats::SessionStats;
use crate::capture::{
    CaptureHost, CaptureSource, LogPreview, PreviewSurface, StreamConstraints,
};
use crate::error::{Error, Result};
use crate::export::{ExportOutcome, Exporter, SaveDialog};
use crate::picker::{SourceMenu, SourcePicker};
use crate::recorder::{ChunkBuffer, Recorder, RecorderState};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Label shown before any source has been selected
pub const DEFAULT_SOURCE_LABEL: &str = "Choose a Video Source";

/// A recording session: select a source, record it, save the result
///
/// The session owns its recorder and fragment buffer, so two sessions never
/// share state.
pub struct RecordingSession {
    /// Session configuration
    config: SessionConfig,

    /// Host that enumerates sources and hands out streams
    host: Box<dyn CaptureHost>,

    picker: SourcePicker,

    preview: Box<dyn PreviewSurface>,

    exporter: Exporter,

    /// Currently selected source
    source: Option<CaptureSource>,

    source_label: String,

    recorder: Recorder,

    /// Fragments recorded so far
    chunks: ChunkBuffer,

    started_at: Option<DateTime<Utc>>,

    stopped_at: Option<DateTime<Utc>>,

    recordings_completed: usize,
}

impl RecordingSession {
    /// Create a new recording session
    pub fn new(config: SessionConfig, host: Box<dyn CaptureHost>) -> Self {
        info!(
            "Creating recording session: {} (host: {})",
            config.session_id,
            host.name()
        );

        let exporter = Exporter::new(config.export.clone(), config.mime_type.clone());

        Self {
            config,
            host,
            picker: SourcePicker::default(),
            preview: Box::new(LogPreview),
            exporter,
            source: None,
            source_label: DEFAULT_SOURCE_LABEL.to_string(),
            recorder: Recorder::new(),
            chunks: ChunkBuffer::new(),
            started_at: None,
            stopped_at: None,
            recordings_completed: 0,
        }
    }

    pub fn with_preview(mut self, preview: Box<dyn PreviewSurface>) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_picker(mut self, picker: SourcePicker) -> Self {
        self.picker = picker;
        self
    }

    pub fn id(&self) -> &str {
        &self.config.session_id
    }

    pub fn state(&self) -> RecorderState {
        self.recorder.state()
    }

    pub fn source(&self) -> Option<&CaptureSource> {
        self.source.as_ref()
    }

    /// Name of the selected source, or the placeholder before selection
    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    pub fn chunks(&self) -> &ChunkBuffer {
        &self.chunks
    }

    pub async fn list_sources(&self) -> Result<Vec<CaptureSource>> {
        self.picker.list_sources(self.host.as_ref()).await
    }

    /// Show the source menu and select whatever the user picks
    ///
    /// Returns `Ok(None)` when the menu is dismissed; nothing changes then.
    pub async fn pick_source(&mut self, menu: &mut dyn SourceMenu) -> Result<Option<CaptureSource>> {
        let Some(source) = self.picker.pick(self.host.as_ref(), menu).await? else {
            return Ok(None);
        };

        self.select_source(source.clone()).await?;
        Ok(Some(source))
    }

    /// Select a source by id or name without showing a menu
    pub async fn select_by_query(&mut self, query: &str) -> Result<CaptureSource> {
        let source = self
            .picker
            .find(self.host.as_ref(), query)
            .await?
            .ok_or_else(|| Error::Device(format!("no capture source matches {:?}", query)))?;

        self.select_source(source.clone()).await?;
        Ok(source)
    }

    /// Acquire a video-only stream for `source`, preview it and bind it to the recorder
    pub async fn select_source(&mut self, source: CaptureSource) -> Result<()> {
        if self.recorder.state() == RecorderState::Recording {
            return Err(Error::InvalidState {
                operation: "select a source",
                state: RecorderState::Recording,
            });
        }

        let stream = self.host.acquire(&StreamConstraints::desktop(&source)).await?;
        self.preview.attach(&stream);
        self.recorder.bind(stream)?;

        self.source_label = source.name.clone();
        self.source = Some(source);

        Ok(())
    }

    /// Start recording the bound stream
    pub async fn start(&mut self) -> Result<()> {
        self.recorder.start().await?;

        match self.config.buffer_policy {
            BufferPolicy::ResetOnStart => {
                if !self.chunks.is_empty() {
                    info!("Discarding {} fragments from the previous recording", self.chunks.len());
                }
                self.chunks.clear();
            }
            BufferPolicy::Accumulate => {
                if !self.chunks.is_empty() {
                    warn!(
                        "Appending to {} fragments from a previous recording",
                        self.chunks.len()
                    );
                }
            }
        }

        self.started_at = Some(Utc::now());
        self.stopped_at = None;

        info!("Recording session {} started", self.config.session_id);
        Ok(())
    }

    /// Move fragments that have already arrived into the buffer
    ///
    /// Returns true once the stream has delivered its last fragment, after
    /// which only [`RecordingSession::stop`] is left to do.
    pub fn poll(&mut self) -> bool {
        self.recorder.drain_into(&mut self.chunks)
    }

    /// Stop recording and wait for the buffer to be complete
    ///
    /// Returns the number of fragments in the buffer. Calling this when not
    /// recording fails with [`Error::InvalidState`] and changes nothing.
    pub async fn stop(&mut self) -> Result<usize> {
        self.recorder.stop(&mut self.chunks).await?;

        self.stopped_at = Some(Utc::now());
        self.recordings_completed += 1;

        info!(
            "Recording session {} stopped: {} fragments, {} bytes",
            self.config.session_id,
            self.chunks.len(),
            self.chunks.total_bytes()
        );

        Ok(self.chunks.len())
    }

    /// Save the buffered recording through `dialog`
    ///
    /// The buffer is kept whether or not the dialog is cancelled.
    pub async fn export(&mut self, dialog: &mut dyn SaveDialog) -> Result<ExportOutcome> {
        if self.recorder.state() == RecorderState::Recording {
            return Err(Error::InvalidState {
                operation: "export",
                state: RecorderState::Recording,
            });
        }

        self.exporter.export(&self.chunks, dialog).await
    }

    /// Drop every buffered fragment
    pub fn reset_buffer(&mut self) {
        info!("Clearing {} buffered fragments", self.chunks.len());
        self.chunks.clear();
    }

    pub fn stats(&self) -> SessionStats {
        let duration_secs = match self.started_at {
            Some(started) => {
                let end = self.stopped_at.unwrap_or_else(Utc::now);
                end.signed_duration_since(started).num_milliseconds() as f64 / 1000.0
            }
            None => 0.0,
        };

        SessionStats {
            session_id: self.config.session_id.clone(),
            state: self.recorder.state(),
            source: self.source.as_ref().map(|s| s.name.clone()),
            started_at: self.started_at,
            duration_secs,
            chunks_count: self.chunks.len(),
            total_bytes: self.chunks.total_bytes(),
            recordings_completed: self.recordings_completed,
        }
    }
}
