//! Turning a finished recording into a file

mod dialog;
mod exporter;

pub use dialog::{AcceptDefaultDialog, FixedPathDialog, SaveDialog, SaveDialogOptions};
pub use exporter::{ExportOutcome, Exporter, OutputFile, VideoBlob};
