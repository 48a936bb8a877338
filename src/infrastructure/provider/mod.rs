//! Provider infrastructure module
//!
//! HTTP clients for the supported AI backends.

mod gemini;
pub mod http;
mod openai_compat;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;

use std::sync::Arc;

use crate::application::ports::{ProviderClient, ProviderError};
use crate::domain::config::ProviderSettings;
use crate::domain::config::{GEMINI_BASE_URL, OPENAI_BASE_URL};
use crate::domain::provider::{ProviderId, ProxyConfig};

/// Create the client for `id`, using the configured endpoint and proxy
pub fn create_provider(
    id: ProviderId,
    settings: &ProviderSettings,
    proxy: &ProxyConfig,
) -> Result<Arc<dyn ProviderClient>, ProviderError> {
    let client = http::build_client(proxy, http::REQUEST_TIMEOUT)?;
    let base_url = settings.base_url.trim();

    Ok(match id {
        ProviderId::Gemini => {
            let base = if base_url.is_empty() { GEMINI_BASE_URL } else { base_url };
            Arc::new(GeminiProvider::new(base, client))
        }
        ProviderId::OpenAi => {
            let base = if base_url.is_empty() { OPENAI_BASE_URL } else { base_url };
            Arc::new(OpenAiCompatProvider::new(base, client))
        }
    })
}
