//! Ydotool keystroke adapter for Wayland support

use async_trait::async_trait;

use crate::application::ports::{Chord, Keystroke, KeystrokeError};

use super::command::run_tool;

/// Linux input event codes
const KEY_LEFTCTRL: u16 = 29;
const KEY_C: u16 = 46;
const KEY_V: u16 = 47;

/// Ydotool keystroke adapter for Wayland key injection
///
/// Requires ydotoold daemon to be running and user to be in the input group.
pub struct YdotoolKeystroke;

impl YdotoolKeystroke {
    /// Create a new ydotool keystroke adapter
    pub fn new() -> Self {
        Self
    }

    /// `code:1` presses, `code:0` releases
    fn sequence(chord: Chord) -> Vec<String> {
        let letter = match chord {
            Chord::Copy => KEY_C,
            Chord::Paste => KEY_V,
        };
        vec![
            format!("{}:1", KEY_LEFTCTRL),
            format!("{}:1", letter),
            format!("{}:0", letter),
            format!("{}:0", KEY_LEFTCTRL),
        ]
    }
}

impl Default for YdotoolKeystroke {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Keystroke for YdotoolKeystroke {
    async fn send_chord(&self, chord: Chord) -> Result<(), KeystrokeError> {
        let sequence = Self::sequence(chord);
        let mut args = vec!["key"];
        args.extend(sequence.iter().map(String::as_str));
        run_tool("ydotool", &args, chord).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paste_sequence_presses_and_releases() {
        assert_eq!(
            YdotoolKeystroke::sequence(Chord::Paste),
            vec!["29:1", "47:1", "47:0", "29:0"]
        );
    }
}
