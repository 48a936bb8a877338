//! Desktop notification port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::job::FailureKind;

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Failed to show notification: {0}")]
    SendFailed(String),
}

/// Whether a notice reports a finished or a failed job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// One job-outcome notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub kind: NoticeKind,
}

impl Notice {
    pub fn job_succeeded(label: &str, elapsed_secs: f64) -> Self {
        Self {
            title: label.to_string(),
            body: format!("Done in {:.1}s", elapsed_secs),
            kind: NoticeKind::Success,
        }
    }

    pub fn job_failed(label: &str, kind: FailureKind, message: &str) -> Self {
        Self {
            title: format!("{} failed", label),
            body: format!("{}: {}", kind, message),
            kind: NoticeKind::Failure,
        }
    }
}

/// Port for desktop notifications.
///
/// Delivery is best-effort; callers log and ignore errors.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notice: &Notice) -> Result<(), NotificationError>;
}

#[async_trait]
impl Notifier for Box<dyn Notifier> {
    async fn show(&self, notice: &Notice) -> Result<(), NotificationError> {
        self.as_ref().show(notice).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_notice_reports_elapsed() {
        let notice = Notice::job_succeeded("Fix grammar (Ctrl+F1)", 1.234);
        assert_eq!(notice.body, "Done in 1.2s");
        assert_eq!(notice.kind, NoticeKind::Success);
    }

    #[test]
    fn failure_notice_names_the_kind() {
        let notice = Notice::job_failed("Fix", FailureKind::EmptyCapture, "nothing selected");
        assert_eq!(notice.title, "Fix failed");
        assert!(notice.body.ends_with(": nothing selected"));
        assert_eq!(notice.kind, NoticeKind::Failure);
    }
}
