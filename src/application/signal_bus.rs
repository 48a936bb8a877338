//! One-way notification channel from the pipeline to the presentation layer

use tokio::sync::mpsc;
use tracing::trace;

use crate::domain::job::FailureKind;

/// Immutable event record consumed by the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Free-form log line; `color` is a display hint such as `#FBB6CE`
    Log {
        message: String,
        color: Option<String>,
    },
    JobStarted {
        label: String,
    },
    JobSucceeded {
        label: String,
        elapsed_secs: f64,
    },
    JobFailed {
        label: String,
        kind: FailureKind,
        message: String,
    },
}

/// Sending half of the bus; cheap to clone
#[derive(Debug, Clone)]
pub struct SignalBus {
    tx: mpsc::UnboundedSender<Signal>,
}

/// Receiving half, owned by the presentation layer
pub type SignalReceiver = mpsc::UnboundedReceiver<Signal>;

impl SignalBus {
    pub fn channel() -> (Self, SignalReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Never blocks; signals sent after the receiver is dropped are discarded
    pub fn send(&self, signal: Signal) {
        if self.tx.send(signal).is_err() {
            trace!("signal receiver closed, dropping signal");
        }
    }

    pub fn log(&self, message: impl Into<String>, color: Option<&str>) {
        self.send(Signal::Log {
            message: message.into(),
            color: color.map(str::to_string),
        });
    }

    pub fn job_started(&self, label: impl Into<String>) {
        self.send(Signal::JobStarted {
            label: label.into(),
        });
    }

    pub fn job_succeeded(&self, label: impl Into<String>, elapsed_secs: f64) {
        self.send(Signal::JobSucceeded {
            label: label.into(),
            elapsed_secs,
        });
    }

    pub fn job_failed(&self, label: impl Into<String>, kind: FailureKind, message: impl Into<String>) {
        self.send(Signal::JobFailed {
            label: label.into(),
            kind,
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signals_arrive_in_order() {
        let (bus, mut rx) = SignalBus::channel();
        bus.job_started("Ctrl+F1: Fix");
        bus.log("working", Some("#FFFFFF"));
        bus.job_succeeded("Ctrl+F1: Fix", 1.5);

        assert!(matches!(rx.recv().await, Some(Signal::JobStarted { .. })));
        assert_eq!(
            rx.recv().await,
            Some(Signal::Log {
                message: "working".to_string(),
                color: Some("#FFFFFF".to_string())
            })
        );
        assert!(matches!(
            rx.recv().await,
            Some(Signal::JobSucceeded { elapsed_secs, .. }) if elapsed_secs == 1.5
        ));
    }

    #[test]
    fn send_after_receiver_dropped_is_silent() {
        let (bus, rx) = SignalBus::channel();
        drop(rx);
        bus.job_failed("x", FailureKind::Auth, "bad key");
    }
}
