//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod clipboard;
pub mod config;
pub mod hotkey;
pub mod keystroke;
pub mod notifier;
pub mod provider;

// Re-export common types
pub use clipboard::{Clipboard, ClipboardError};
pub use config::ConfigStore;
pub use hotkey::{HotkeyError, KeyEvent, KeyEventSink, KeyEventSource};
pub use keystroke::{Chord, Keystroke, KeystrokeError};
pub use notifier::{Notice, NoticeKind, NotificationError, Notifier};
pub use provider::{ProviderClient, ProviderError};
