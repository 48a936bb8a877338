//! Desktop notifications for job outcomes

mod notify_rust;

pub use notify_rust::NotifyRustNotifier;

use crate::application::ports::Notifier;

pub fn create_notifier() -> Box<dyn Notifier> {
    Box::new(NotifyRustNotifier::new())
}
