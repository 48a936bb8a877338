//! Wtype keystroke adapter for Wayland support

use async_trait::async_trait;

use crate::application::ports::{Chord, Keystroke, KeystrokeError};

use super::command::run_tool;

/// Wtype keystroke adapter for Wayland key injection
///
/// Uses the wtype tool which talks the virtual-keyboard protocol.
pub struct WtypeKeystroke;

impl WtypeKeystroke {
    /// Create a new wtype keystroke adapter
    pub fn new() -> Self {
        Self
    }
}

impl Default for WtypeKeystroke {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Keystroke for WtypeKeystroke {
    async fn send_chord(&self, chord: Chord) -> Result<(), KeystrokeError> {
        let key = chord.letter().to_string();
        run_tool("wtype", &["-M", "ctrl", "-k", &key, "-m", "ctrl"], chord).await
    }
}
