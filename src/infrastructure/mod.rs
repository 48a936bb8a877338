//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces, integrating with the
//! platform clipboard, keyboard, desktop notifications and AI provider APIs.

pub mod clipboard;
pub mod config;
pub mod hotkey;
pub mod keystroke;
pub mod notification;
pub mod provider;

// Re-export adapters
pub use clipboard::ArboardClipboard;
pub use config::XdgConfigStore;
pub use hotkey::{create_key_source, RdevKeySource};
pub use keystroke::{create_keystroke, EnigoKeystroke, KeystrokeTool, KeystrokeToolPreference};
pub use notification::{create_notifier, NotifyRustNotifier};
pub use provider::{create_provider, GeminiProvider, OpenAiCompatProvider};
