//! Job error taxonomy

use std::fmt;

use thiserror::Error;

use crate::domain::provider::ProviderId;

/// Classified cause of a failed job, carried by failure notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    EmptyCapture,
    NoActiveKey,
    QuotaExhausted,
    Transient,
    Auth,
    Clipboard,
    Provider,
    Internal,
}

impl FailureKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyCapture => "empty-capture",
            Self::NoActiveKey => "no-active-key",
            Self::QuotaExhausted => "quota-exhausted",
            Self::Transient => "transient",
            Self::Auth => "auth",
            Self::Clipboard => "clipboard",
            Self::Provider => "provider",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every non-success outcome of a job.
///
/// `Cancelled` is not a failure: it ends the job in the cancelled state
/// without a failure notification.
#[derive(Debug, Clone, Error)]
pub enum JobError {
    #[error("Nothing selected: clipboard stayed empty after {attempts} copy attempts")]
    EmptyCapture { attempts: u32 },

    #[error("No active API key configured for {provider}")]
    NoActiveKey { provider: ProviderId },

    #[error("Quota exhausted for {provider} after trying {attempts} key(s)")]
    QuotaExhausted { provider: ProviderId, attempts: usize },

    #[error("Provider unavailable after {attempts} attempt(s): {message}")]
    Transient { message: String, attempts: u32 },

    #[error("Invalid API key for {provider}: {message}")]
    Auth { provider: ProviderId, message: String },

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Cancelled")]
    Cancelled,
}

impl JobError {
    /// Failure classification, or None for cancellation
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::EmptyCapture { .. } => Some(FailureKind::EmptyCapture),
            Self::NoActiveKey { .. } => Some(FailureKind::NoActiveKey),
            Self::QuotaExhausted { .. } => Some(FailureKind::QuotaExhausted),
            Self::Transient { .. } => Some(FailureKind::Transient),
            Self::Auth { .. } => Some(FailureKind::Auth),
            Self::Clipboard(_) => Some(FailureKind::Clipboard),
            Self::Provider(_) => Some(FailureKind::Provider),
            Self::Internal(_) => Some(FailureKind::Internal),
            Self::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
