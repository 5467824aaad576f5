use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;

/// What the save dialog is opened with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDialogOptions {
    pub default_path: PathBuf,
    pub button_label: String,
}

/// Asks the user where to save a recording
#[async_trait]
pub trait SaveDialog: Send {
    /// Returns the chosen path, or `None` if the dialog was cancelled
    async fn show_save_dialog(&mut self, options: &SaveDialogOptions) -> Result<Option<PathBuf>>;
}

/// Dialog that answers with a path decided up front (e.g. `--output`)
#[derive(Debug, Clone, Default)]
pub struct FixedPathDialog {
    path: Option<PathBuf>,
}

impl FixedPathDialog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SaveDialog for FixedPathDialog {
    async fn show_save_dialog(&mut self, _options: &SaveDialogOptions) -> Result<Option<PathBuf>> {
        Ok(self.path.clone())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptDefaultDialog;

#[async_trait]
impl SaveDialog for AcceptDefaultDialog {
    async fn show_save_dialog(&mut self, options: &SaveDialogOptions) -> Result<Option<PathBuf>> {
        Ok(Some(options.default_path.clone()))
    }
}
