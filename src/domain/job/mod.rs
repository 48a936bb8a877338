//! Job domain module

mod content;
mod error;
mod prompt;
mod state;

pub use content::{CapturedInput, ClipboardContent, EncodedImage, ImageEncodeError, RgbaImage};
pub use error::{FailureKind, JobError};
pub use prompt::{GenerationRequest, ORIGINAL_PLACEHOLDER, RESULT_PLACEHOLDER, TEXT_PLACEHOLDER};
pub use state::{InvalidStateTransition, JobLifecycle, JobState};

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::domain::hotkey::HotkeyBinding;

/// Terminal result of a job
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Completed { text: String },
    Failed(JobError),
    Cancelled,
}

/// One hotkey-to-completion run.
///
/// Owned solely by the queue worker for its whole lifetime.
#[derive(Debug)]
pub struct Job {
    id: u64,
    binding: HotkeyBinding,
    cancel: CancellationToken,
    started_at: Instant,
    lifecycle: JobLifecycle,
    input: Option<CapturedInput>,
}

impl Job {
    pub fn new(id: u64, binding: HotkeyBinding, cancel: CancellationToken) -> Self {
        Self {
            id,
            binding,
            cancel,
            started_at: Instant::now(),
            lifecycle: JobLifecycle::new(),
            input: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn binding(&self) -> &HotkeyBinding {
        &self.binding
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn state(&self) -> JobState {
        self.lifecycle.state()
    }

    pub fn advance(&mut self, next: JobState) -> Result<(), InvalidStateTransition> {
        self.lifecycle.advance(next)
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn set_input(&mut self, input: CapturedInput) {
        self.input = Some(input);
    }

    pub fn take_input(&mut self) -> Option<CapturedInput> {
        self.input.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_starts_queued_and_tracks_cancel() {
        let token = CancellationToken::new();
        let binding = HotkeyBinding::new("Ctrl+F1".parse().unwrap(), "Fix", "p");
        let job = Job::new(1, binding, token.clone());

        assert_eq!(job.state(), JobState::Queued);
        assert!(!job.is_cancelled());
        token.cancel();
        assert!(job.is_cancelled());
    }

    #[test]
    fn input_is_taken_once() {
        let binding = HotkeyBinding::new("Ctrl+F1".parse().unwrap(), "Fix", "p");
        let mut job = Job::new(1, binding, CancellationToken::new());
        job.set_input(CapturedInput::Text("x".into()));
        assert!(job.take_input().is_some());
        assert!(job.take_input().is_none());
    }
}
