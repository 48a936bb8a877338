//! Keystroke infrastructure module
//!
//! Sends the copy/paste shortcuts using enigo (default) or a native
//! injection tool on Linux.

mod command;
mod enigo;
mod factory;
mod wtype;
mod xdotool;
mod ydotool;

pub use enigo::EnigoKeystroke;
pub use factory::{
    create_keystroke, detect_keystroke_tool, KeystrokeTool, KeystrokeToolPreference,
    ParseKeystrokeToolError, VALID_KEYSTROKE_TOOLS,
};
pub use wtype::WtypeKeystroke;
pub use xdotool::XdotoolKeystroke;
pub use ydotool::YdotoolKeystroke;
