pub mod backend;
pub mod ffmpeg;
pub mod preview;
pub mod replay;
pub mod source;

pub use backend::{
    CaptureBackend, CaptureHost, CaptureHostFactory, Fragment, MediaStream, StreamConstraints,
    VideoConstraints,
};
pub use ffmpeg::FfmpegHost;
pub use preview::{LogPreview, PreviewSurface};
pub use replay::ReplayHost;
pub use source::{CaptureSource, SourceKind};
