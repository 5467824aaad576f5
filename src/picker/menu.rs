use async_trait::async_trait;

use crate::error::Result;

/// One entry in the source selection menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
}

/// Flat popup menu
#[async_trait]
pub trait SourceMenu: Send {
    /// Show `items` and wait for a choice
    ///
    /// Returns the index of the chosen item, or `None` if the menu was dismissed.
    async fn popup(&mut self, items: &[MenuItem]) -> Result<Option<usize>>;
}
