//! Job lifecycle state machine

use std::fmt;
use thiserror::Error;

/// Job states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobState {
    #[default]
    Queued,
    Capturing,
    Dispatching,
    AwaitingCompletion,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Capturing => "capturing",
            Self::Dispatching => "dispatching",
            Self::AwaitingCompletion => "awaiting-completion",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal states accept no further transitions
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid job transition: cannot move from {from} to {to}")]
pub struct InvalidStateTransition {
    pub from: JobState,
    pub to: JobState,
}

/// Job lifecycle entity.
///
/// State machine:
///   QUEUED -> CAPTURING -> DISPATCHING -> AWAITING_COMPLETION -> COMPLETED
///   any non-terminal -> FAILED | CANCELLED
#[derive(Debug, Default)]
pub struct JobLifecycle {
    state: JobState,
}

impl JobLifecycle {
    pub fn new() -> Self {
        Self {
            state: JobState::Queued,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move to `next` if the transition is allowed
    pub fn advance(&mut self, next: JobState) -> Result<(), InvalidStateTransition> {
        use JobState::*;

        let allowed = match (self.state, next) {
            (Queued, Capturing) => true,
            (Capturing, Dispatching) => true,
            (Dispatching, AwaitingCompletion) => true,
            (AwaitingCompletion, Completed) => true,
            (from, Failed | Cancelled) => !from.is_terminal(),
            _ => false,
        };

        if !allowed {
            return Err(InvalidStateTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
