//! Domain layer: hotkey bindings, key pools, jobs and the config model.
//!
//! Nothing here touches the clipboard, the keyboard or the network.

pub mod config;
pub mod error;
pub mod hotkey;
pub mod job;
pub mod provider;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use hotkey::{HotkeyBinding, KeyCombination, KeyId};
pub use job::{Job, JobError, JobState};
pub use provider::{ApiKey, ProviderId};
