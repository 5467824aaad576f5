//! Capture source selection

mod menu;

pub use menu::{MenuItem, SourceMenu};

use tracing::info;

use crate::capture::{CaptureHost, CaptureSource, SourceKind};
use crate::error::Result;

/// Enumerates capture sources and lets the user choose one from a menu
#[derive(Debug, Clone)]
pub struct SourcePicker {
    kinds: Vec<SourceKind>,
}

impl Default for SourcePicker {
    fn default() -> Self {
        Self {
            kinds: SourceKind::ALL.to_vec(),
        }
    }
}

impl SourcePicker {
    pub fn new(kinds: Vec<SourceKind>) -> Self {
        Self { kinds }
    }

    /// Sources of the configured kinds, in host order
    pub async fn list_sources(&self, host: &dyn CaptureHost) -> Result<Vec<CaptureSource>> {
        host.list_sources(&self.kinds).await
    }

    /// One menu item per source, labelled with the source name
    pub fn build_menu(sources: &[CaptureSource]) -> Vec<MenuItem> {
        sources
            .iter()
            .map(|source| MenuItem {
                label: source.name.clone(),
            })
            .collect()
    }

    /// List sources, pop up the menu and return the selection
    ///
    /// A dismissed menu yields `Ok(None)`.
    pub async fn pick(
        &self,
        host: &dyn CaptureHost,
        menu: &mut dyn SourceMenu,
    ) -> Result<Option<CaptureSource>> {
        let mut sources = self.list_sources(host).await?;
        let items = Self::build_menu(&sources);

        match menu.popup(&items).await? {
            Some(index) if index < sources.len() => {
                let source = sources.swap_remove(index);
                info!("Selected source: {}", source);
                Ok(Some(source))
            }
            _ => {
                info!("Source menu dismissed");
                Ok(None)
            }
        }
    }

    /// Find a source by id or name without showing a menu
    pub async fn find(&self, host: &dyn CaptureHost, query: &str) -> Result<Option<CaptureSource>> {
        Ok(self
            .list_sources(host)
            .await?
            .into_iter()
            .find(|source| source.matches(query)))
    }
}
