//! Cross-platform clipboard adapter using arboard
//!
//! Works on Windows, macOS, and Linux (X11/Wayland).

use std::borrow::Cow;
use std::sync::{Arc, Mutex, PoisonError};

use arboard::ImageData;
use async_trait::async_trait;

use crate::application::ports::{Clipboard, ClipboardError};
use crate::domain::job::{ClipboardContent, RgbaImage};

/// Cross-platform clipboard adapter using arboard.
///
/// One platform handle is kept alive for the adapter's lifetime; on X11 the
/// written content is only served while its owner exists.
#[derive(Clone, Default)]
pub struct ArboardClipboard {
    handle: Arc<Mutex<Option<arboard::Clipboard>>>,
}

impl ArboardClipboard {
    /// Create a new arboard clipboard adapter
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the shared handle on the blocking pool
    async fn with_handle<T, F>(&self, f: F) -> Result<T, ClipboardError>
    where
        T: Send + 'static,
        F: FnOnce(&mut arboard::Clipboard) -> Result<T, ClipboardError> + Send + 'static,
    {
        let handle = Arc::clone(&self.handle);

        // arboard operations are blocking, so run in spawn_blocking
        tokio::task::spawn_blocking(move || {
            let mut slot = handle.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                let clipboard = arboard::Clipboard::new()
                    .map_err(|e| ClipboardError::ClipboardUnavailable(e.to_string()))?;
                *slot = Some(clipboard);
            }
            match slot.as_mut() {
                Some(clipboard) => f(clipboard),
                None => Err(ClipboardError::ClipboardUnavailable(
                    "clipboard handle missing".to_string(),
                )),
            }
        })
        .await
        .map_err(|e| ClipboardError::ClipboardUnavailable(format!("Task join error: {}", e)))?
    }
}

fn read_content(clipboard: &mut arboard::Clipboard) -> Result<ClipboardContent, ClipboardError> {
    match clipboard.get_image() {
        Ok(image) => {
            return Ok(ClipboardContent::Image(RgbaImage::new(
                image.width,
                image.height,
                image.bytes.into_owned(),
            )))
        }
        Err(arboard::Error::ContentNotAvailable) => {}
        Err(e) => return Err(ClipboardError::ReadFailed(e.to_string())),
    }

    match clipboard.get_text() {
        Ok(text) => Ok(ClipboardContent::Text(text)),
        Err(arboard::Error::ContentNotAvailable) => Ok(ClipboardContent::Empty),
        Err(e) => Err(ClipboardError::ReadFailed(e.to_string())),
    }
}

fn write_content(
    clipboard: &mut arboard::Clipboard,
    content: ClipboardContent,
) -> Result<(), ClipboardError> {
    let result = match content {
        ClipboardContent::Empty => clipboard.clear(),
        ClipboardContent::Text(text) => clipboard.set_text(text),
        ClipboardContent::Image(image) => clipboard.set_image(ImageData {
            width: image.width,
            height: image.height,
            bytes: Cow::Owned(image.bytes),
        }),
    };
    result.map_err(|e| ClipboardError::WriteFailed(e.to_string()))
}

#[async_trait]
impl Clipboard for ArboardClipboard {
    async fn read(&self) -> Result<ClipboardContent, ClipboardError> {
        self.with_handle(read_content).await
    }

    async fn write(&self, content: &ClipboardContent) -> Result<(), ClipboardError> {
        let content = content.clone();
        self.with_handle(move |clipboard| write_content(clipboard, content))
            .await
    }
}
