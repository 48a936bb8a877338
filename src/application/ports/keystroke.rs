//! Keystroke port interface

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Keystroke errors
#[derive(Debug, Clone, Error)]
pub enum KeystrokeError {
    #[error("{0} not found. Please install it or choose another keystroke_tool.")]
    ToolNotFound(&'static str),

    #[error("No keystroke tool available")]
    NoToolAvailable,

    #[error("Failed to send {chord}: {message}")]
    SendFailed { chord: Chord, message: String },
}

/// Editing shortcuts the pipeline simulates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chord {
    Copy,
    Paste,
}

impl Chord {
    /// Letter pressed together with the platform's primary modifier
    pub const fn letter(&self) -> char {
        match self {
            Self::Copy => 'c',
            Self::Paste => 'v',
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::Paste => write!(f, "paste"),
        }
    }
}

/// Port for keystroke injection
#[async_trait]
pub trait Keystroke: Send + Sync {
    /// Send a copy/paste shortcut to the focused window.
    ///
    /// # Arguments
    /// * `chord` - The shortcut to simulate
    ///
    /// # Returns
    /// Ok(()) once the key events have been injected
    async fn send_chord(&self, chord: Chord) -> Result<(), KeystrokeError>;
}

/// Blanket implementation for boxed keystroke types
#[async_trait]
impl Keystroke for Box<dyn Keystroke> {
    async fn send_chord(&self, chord: Chord) -> Result<(), KeystrokeError> {
        self.as_ref().send_chord(chord).await
    }
}
