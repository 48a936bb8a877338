//! Xdotool keystroke adapter for X11 support

use async_trait::async_trait;

use crate::application::ports::{Chord, Keystroke, KeystrokeError};

use super::command::run_tool;

/// Xdotool keystroke adapter for X11 key injection
pub struct XdotoolKeystroke;

impl XdotoolKeystroke {
    /// Create a new xdotool keystroke adapter
    pub fn new() -> Self {
        Self
    }

    fn combo(chord: Chord) -> String {
        format!("ctrl+{}", chord.letter())
    }
}

impl Default for XdotoolKeystroke {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Keystroke for XdotoolKeystroke {
    async fn send_chord(&self, chord: Chord) -> Result<(), KeystrokeError> {
        // --clearmodifiers lifts the user's still-held hotkey modifiers
        let combo = Self::combo(chord);
        run_tool("xdotool", &["key", "--clearmodifiers", &combo], chord).await
    }
}
