//! notify-rust adapter

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};

use crate::application::ports::{Notice, NoticeKind, NotificationError, Notifier};

const APP_NAME: &str = "HotPrompt";

/// Failures stay on screen longer than successes
const SUCCESS_TIMEOUT_MS: u32 = 3000;
const FAILURE_TIMEOUT_MS: u32 = 8000;

/// Shows job outcomes as desktop notifications
#[derive(Debug, Default)]
pub struct NotifyRustNotifier;

impl NotifyRustNotifier {
    pub fn new() -> Self {
        Self
    }

    /// Freedesktop icon and timeout for a notice
    fn presentation(kind: NoticeKind) -> (&'static str, u32) {
        match kind {
            NoticeKind::Success => ("dialog-ok", SUCCESS_TIMEOUT_MS),
            NoticeKind::Failure => ("dialog-error", FAILURE_TIMEOUT_MS),
        }
    }
}

#[async_trait]
impl Notifier for NotifyRustNotifier {
    async fn show(&self, notice: &Notice) -> Result<(), NotificationError> {
        let notice = notice.clone();
        let (icon, timeout) = Self::presentation(notice.kind);

        // Talks to the session bus and may block
        tokio::task::spawn_blocking(move || {
            let mut notification = Notification::new();
            notification
                .appname(APP_NAME)
                .summary(&notice.title)
                .body(&notice.body)
                .icon(icon)
                .timeout(Timeout::Milliseconds(timeout));
            #[cfg(all(unix, not(target_os = "macos")))]
            if notice.kind == NoticeKind::Success {
                notification.urgency(notify_rust::Urgency::Low);
            }

            notification
                .show()
                .map(|_| ())
                .map_err(|e| NotificationError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("notification task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_linger() {
        let (_, ok) = NotifyRustNotifier::presentation(NoticeKind::Success);
        let (icon, failed) = NotifyRustNotifier::presentation(NoticeKind::Failure);
        assert!(failed > ok);
        assert_eq!(icon, "dialog-error");
    }
}
