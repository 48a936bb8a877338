//! Key tester: one minimal generation per configured key

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::application::ports::{ConfigStore, ProviderClient, ProviderError};
use crate::domain::error::ConfigError;
use crate::domain::job::GenerationRequest;
use crate::domain::provider::{ApiKey, ProviderId};
use crate::infrastructure::create_provider;

use super::presenter::Presenter;

const CHECK_PROMPT: &str = "Reply with the single word OK.";

/// Result of probing one key
#[derive(Debug)]
pub struct KeyCheck {
    pub label: String,
    pub masked: String,
    pub result: Result<Duration, ProviderError>,
}

/// Failure of the check command as a whole
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create HTTP client: {0}")]
    Client(ProviderError),

    #[error("No configured keys for {0}")]
    NoKeys(ProviderId),

    #[error("No working key for {0}")]
    AllFailed(ProviderId),
}

/// Test each configured key of `provider` in order
pub async fn check_keys(
    client: &Arc<dyn ProviderClient>,
    keys: &[ApiKey],
    model: &str,
    cancel: &CancellationToken,
) -> Vec<KeyCheck> {
    let request = GenerationRequest::text(CHECK_PROMPT, model);
    let mut results = Vec::with_capacity(keys.len());

    for (index, key) in keys.iter().enumerate() {
        if !key.is_configured() {
            continue;
        }
        let started = Instant::now();
        let result = client
            .generate(&key.key, &request, cancel)
            .await
            .map(|_| started.elapsed());
        results.push(KeyCheck {
            label: key.display_label(index),
            masked: key.masked(),
            result,
        });
    }
    results
}

/// Handle check subcommand
pub async fn handle_check_command<S: ConfigStore>(
    provider: Option<ProviderId>,
    store: &S,
    presenter: &Presenter,
) -> Result<(), CheckError> {
    let config = store.load().await?;
    let provider = provider.unwrap_or(config.provider);
    let settings = config.providers.get(provider);

    if !settings.api_keys.iter().any(ApiKey::is_configured) {
        return Err(CheckError::NoKeys(provider));
    }

    let client = create_provider(provider, settings, &config.proxy).map_err(CheckError::Client)?;
    let model = settings.model().unwrap_or_default();
    presenter.info(&format!("Checking {} keys with {}", provider, model));

    let results = check_keys(&client, &settings.api_keys, model, &CancellationToken::new()).await;

    let mut working = 0;
    for check in &results {
        match &check.result {
            Ok(elapsed) => {
                working += 1;
                presenter.success(&format!(
                    "{} ({}): ok ({:.2}s)",
                    check.label,
                    check.masked,
                    elapsed.as_secs_f64()
                ));
            }
            Err(e) => presenter.error(&format!("{} ({}): {}", check.label, check.masked, e)),
        }
    }

    if working == 0 {
        return Err(CheckError::AllFailed(provider));
    }
    Ok(())
}
