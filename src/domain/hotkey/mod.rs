//! Hotkey domain module

mod binding;
mod combination;

pub use binding::{HotkeyBinding, ModelOverride};
pub use combination::{KeyCombination, KeyId};
