//! Cross-platform keystroke adapter using enigo
//!
//! Works on Windows, macOS, and Linux (X11/Wayland).

use async_trait::async_trait;

use crate::application::ports::{Chord, Keystroke, KeystrokeError};

/// Cross-platform keystroke adapter using enigo
pub struct EnigoKeystroke;

impl EnigoKeystroke {
    /// Create a new enigo keystroke adapter
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnigoKeystroke {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Keystroke for EnigoKeystroke {
    async fn send_chord(&self, chord: Chord) -> Result<(), KeystrokeError> {
        // enigo operations are blocking, so run in spawn_blocking
        tokio::task::spawn_blocking(move || {
            use enigo::{Direction, Enigo, Key, Keyboard, Settings};

            let failed = |message: String| KeystrokeError::SendFailed { chord, message };

            let mut enigo = Enigo::new(&Settings::default())
                .map_err(|e| failed(format!("Failed to create enigo: {}", e)))?;

            #[cfg(target_os = "macos")]
            let modifier = Key::Meta;
            #[cfg(not(target_os = "macos"))]
            let modifier = Key::Control;

            enigo
                .key(modifier, Direction::Press)
                .map_err(|e| failed(e.to_string()))?;
            let clicked = enigo.key(Key::Unicode(chord.letter()), Direction::Click);
            // Always release the modifier, even if the click failed
            let released = enigo.key(modifier, Direction::Release);

            clicked.map_err(|e| failed(e.to_string()))?;
            released.map_err(|e| failed(e.to_string()))
        })
        .await
        .map_err(|e| KeystrokeError::SendFailed {
            chord,
            message: format!("Task join error: {}", e),
        })?
    }
}
