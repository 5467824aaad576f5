pub mod capture;
pub mod config;
pub mod error;
pub mod export;
pub mod picker;
pub mod recorder;
pub mod session;
pub mod terminal;

pub use capture::{
    CaptureBackend, CaptureHost, CaptureHostFactory, CaptureSource, Fragment, MediaStream,
    PreviewSurface, SourceKind, StreamConstraints,
};
pub use config::Config;
pub use error::{Error, Result};
pub use export::{ExportOutcome, Exporter, FixedPathDialog, OutputFile, SaveDialog, VideoBlob};
pub use picker::{MenuItem, SourceMenu, SourcePicker};
pub use recorder::{ChunkBuffer, Recorder, RecorderEvent, RecorderState};
pub use session::{BufferPolicy, RecordingSession, SessionConfig, SessionStats};
pub use terminal::Terminal;
