//! Provider client port interface

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::job::GenerationRequest;
use crate::domain::provider::ProviderId;

/// Provider call errors, classified at the adapter boundary
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("Quota exceeded or rate limited: {0}")]
    RateLimited(String),

    #[error("Network or server error: {0}")]
    Transient(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Quota/rate-limit signal; the only error that triggers key rotation
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Worth retrying with the same key after a backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Port for AI text/vision generation
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Which backend this client talks to
    fn id(&self) -> ProviderId;

    /// Generate text for a resolved request.
    ///
    /// # Arguments
    /// * `api_key` - Credential for this single call
    /// * `request` - Prompt, optional image payload and model
    /// * `cancel` - Aborts the in-flight request when signalled
    ///
    /// # Returns
    /// The plain result text, normalized from the provider's response format
    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError>;
}

/// Blanket implementation for boxed provider types
#[async_trait]
impl ProviderClient for Box<dyn ProviderClient> {
    fn id(&self) -> ProviderId {
        self.as_ref().id()
    }

    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        self.as_ref().generate(api_key, request, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limit_is_quota() {
        assert!(ProviderError::RateLimited("429".into()).is_quota());
        assert!(!ProviderError::InvalidApiKey("bad".into()).is_quota());
        assert!(!ProviderError::Transient("503".into()).is_quota());
    }
}
