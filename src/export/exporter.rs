use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

use super::dialog::{SaveDialog, SaveDialogOptions};
use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::recorder::ChunkBuffer;

/// Finished recording held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoBlob {
    /// Container/codec tag, e.g. "video/webm; codecs=vp9"
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A recording written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub bytes_written: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved(OutputFile),
    /// The save dialog was dismissed; nothing was written
    Cancelled,
}

/// Assembles buffered fragments into a file the user picks
#[derive(Debug, Clone)]
pub struct Exporter {
    config: ExportConfig,
    mime_type: String,
}

impl Exporter {
    pub fn new(config: ExportConfig, mime_type: impl Into<String>) -> Self {
        Self {
            config,
            mime_type: mime_type.into(),
        }
    }

    /// Concatenate every fragment, in order, into one tagged blob
    pub fn finalize(&self, chunks: &ChunkBuffer) -> VideoBlob {
        VideoBlob {
            mime_type: self.mime_type.clone(),
            data: chunks.concat(),
        }
    }

    /// e.g. "vid-1700000000000.webm"
    pub fn default_file_name(&self, now: DateTime<Utc>) -> String {
        format!(
            "{}-{}.{}",
            self.config.filename_prefix,
            now.timestamp_millis(),
            self.config.extension
        )
    }

    pub fn dialog_options(&self, now: DateTime<Utc>) -> SaveDialogOptions {
        let file_name = self.default_file_name(now);
        let default_path = match &self.config.default_dir {
            Some(dir) => {
                let dir = shellexpand::tilde(&dir.to_string_lossy()).into_owned();
                PathBuf::from(dir).join(file_name)
            }
            None => PathBuf::from(file_name),
        };

        SaveDialogOptions {
            default_path,
            button_label: self.config.button_label.clone(),
        }
    }

    /// Ask for a destination and write the blob there
    ///
    /// Cancelling the dialog is not an error and writes nothing. Existing
    /// files are overwritten; the write is not atomic.
    pub async fn save(&self, blob: &VideoBlob, dialog: &mut dyn SaveDialog) -> Result<ExportOutcome> {
        let options = self.dialog_options(Utc::now());

        let Some(path) = dialog.show_save_dialog(&options).await? else {
            info!("Save dialog cancelled; recording not written");
            return Ok(ExportOutcome::Cancelled);
        };

        if blob.data.is_empty() {
            warn!("Saving an empty recording to {}", path.display());
        }

        tokio::fs::write(&path, &blob.data)
            .await
            .map_err(|source| Error::Write {
                path: path.clone(),
                source,
            })?;

        info!(
            "Video saved successfully to {} ({} bytes, {})",
            path.display(),
            blob.data.len(),
            blob.mime_type
        );

        Ok(ExportOutcome::Saved(OutputFile {
            path,
            bytes_written: blob.data.len(),
        }))
    }

    /// Finalize `chunks` and save the result; the buffer is left untouched
    pub async fn export(&self, chunks: &ChunkBuffer, dialog: &mut dyn SaveDialog) -> Result<ExportOutcome> {
        let blob = self.finalize(chunks);
        self.save(&blob, dialog).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_file_name_uses_unix_millis() {
        let exporter = Exporter::new(ExportConfig::default(), "video/webm; codecs=vp9");
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();

        assert_eq!(exporter.default_file_name(now), "vid-1700000000123.webm");
    }

    #[test]
    fn test_dialog_options_place_default_in_configured_dir() {
        let config = ExportConfig {
            default_dir: Some(PathBuf::from("/videos")),
            filename_prefix: "capture".to_string(),
            extension: "mkv".to_string(),
            ..ExportConfig::default()
        };
        let exporter = Exporter::new(config, "video/x-matroska");
        let now = Utc.timestamp_millis_opt(42).unwrap();

        let options = exporter.dialog_options(now);

        assert_eq!(options.default_path, PathBuf::from("/videos/capture-42.mkv"));
        assert_eq!(options.button_label, "Save video");
    }

    #[test]
    fn test_finalize_tags_mime_type() {
        let exporter = Exporter::new(ExportConfig::default(), "video/webm; codecs=vp9");
        let chunks: ChunkBuffer = vec![b"ab".to_vec(), b"cd".to_vec()].into_iter().collect();

        let blob = exporter.finalize(&chunks);

        assert_eq!(blob.data, b"abcd".to_vec());
        assert_eq!(blob.mime_type, "video/webm; codecs=vp9");
    }
}
