//! Global key event source port

use thiserror::Error;

use crate::domain::hotkey::KeyId;

/// Hotkey capture errors
#[derive(Debug, Clone, Error)]
pub enum HotkeyError {
    #[error("Global key capture unavailable: {0}")]
    Unavailable(String),

    #[error("Key listener already running")]
    AlreadyRunning,
}

/// A physical key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Press(KeyId),
    Release(KeyId),
}

/// Callback receiving key events from the source thread
pub type KeyEventSink = Box<dyn Fn(KeyEvent) + Send + Sync + 'static>;

/// Port for OS-level keyboard observation.
///
/// Implementations deliver events from their own thread and must never block
/// on the sink.
pub trait KeyEventSource: Send + Sync {
    /// Begin delivering events to `sink`
    fn start(&self, sink: KeyEventSink) -> Result<(), HotkeyError>;

    /// Stop delivering events
    fn stop(&self);
}
