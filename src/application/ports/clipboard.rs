//! Clipboard port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::job::ClipboardContent;

/// Clipboard errors
#[derive(Debug, Clone, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    #[error("Failed to read clipboard: {0}")]
    ReadFailed(String),

    #[error("Failed to write clipboard: {0}")]
    WriteFailed(String),
}

/// Port for the platform clipboard
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Read the full clipboard content.
    ///
    /// Image content takes precedence over text when both are present.
    ///
    /// # Returns
    /// The current content, `ClipboardContent::Empty` if nothing usable is held
    async fn read(&self) -> Result<ClipboardContent, ClipboardError>;

    /// Replace the clipboard content.
    ///
    /// # Arguments
    /// * `content` - Content to write; `Empty` clears the clipboard
    async fn write(&self, content: &ClipboardContent) -> Result<(), ClipboardError>;
}

/// Blanket implementation for boxed clipboard types
#[async_trait]
impl Clipboard for Box<dyn Clipboard> {
    async fn read(&self) -> Result<ClipboardContent, ClipboardError> {
        self.as_ref().read().await
    }

    async fn write(&self, content: &ClipboardContent) -> Result<(), ClipboardError> {
        self.as_ref().write(content).await
    }
}
