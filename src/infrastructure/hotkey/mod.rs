//! Global hotkey capture module

mod rdev_source;

pub use rdev_source::RdevKeySource;

use crate::application::ports::KeyEventSource;

/// Create the key event source for the current platform
pub fn create_key_source() -> Box<dyn KeyEventSource> {
    Box::new(RdevKeySource::new())
}
