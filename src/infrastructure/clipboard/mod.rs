//! System clipboard adapter (arboard)

mod arboard;

pub use arboard::ArboardClipboard;
