//! Provider dispatch with key failover, transient retries and cancellation

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::hotkey::HotkeyBinding;
use crate::domain::job::{GenerationRequest, JobError};
use crate::domain::provider::ProviderId;

use super::key_rotator::{ApiKeyRotator, RotationError, SelectedKey};
use super::ports::{ProviderClient, ProviderError};
use super::signal_bus::SignalBus;

/// Retry and cancellation timing
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Extra attempts on the same key after a network/5xx failure
    pub transient_retries: u32,
    pub retry_backoff: Duration,
    /// Upper wait for the provider call to wind down after cancellation
    pub cancel_grace: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            transient_retries: 2,
            retry_backoff: Duration::from_millis(500),
            cancel_grace: Duration::from_secs(2),
        }
    }
}

/// Provider and model a job is sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub provider: ProviderId,
    pub model: String,
}

/// Result of a successful dispatch
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub provider: ProviderId,
    pub key_label: String,
}

/// Routes requests to provider clients through the key rotator
pub struct Dispatcher {
    clients: HashMap<ProviderId, Arc<dyn ProviderClient>>,
    active_models: HashMap<ProviderId, String>,
    default_provider: ProviderId,
    rotator: Arc<ApiKeyRotator>,
    signals: SignalBus,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        default_provider: ProviderId,
        rotator: Arc<ApiKeyRotator>,
        signals: SignalBus,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            clients: HashMap::new(),
            active_models: HashMap::new(),
            default_provider,
            rotator,
            signals,
            settings,
        }
    }

    /// Register a client and the model used when a binding names none
    pub fn with_client(
        mut self,
        client: Arc<dyn ProviderClient>,
        active_model: impl Into<String>,
    ) -> Self {
        let id = client.id();
        self.active_models.insert(id, active_model.into());
        self.clients.insert(id, client);
        self
    }

    pub fn rotator(&self) -> &Arc<ApiKeyRotator> {
        &self.rotator
    }

    /// Binding override first, otherwise the active provider and its model
    pub fn resolve_route(&self, binding: &HotkeyBinding) -> Result<Route, JobError> {
        let (provider, model) = match &binding.model_override {
            Some(routing) => (routing.provider, routing.model.clone()),
            None => (self.default_provider, None),
        };

        let model = model
            .or_else(|| self.active_models.get(&provider).cloned())
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| JobError::Provider(format!("no model configured for {}", provider)))?;

        Ok(Route { provider, model })
    }

    /// Send a request, failing over across keys on quota signals.
    ///
    /// Each distinct key is tried at most once per call; transient failures
    /// are retried on the same key with linear backoff.
    pub async fn dispatch(
        &self,
        provider: ProviderId,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Completion, JobError> {
        let client = self
            .clients
            .get(&provider)
            .cloned()
            .ok_or_else(|| JobError::Provider(format!("provider {} is not available", provider)))?;

        let mut tried = BTreeSet::new();
        loop {
            let key = match self.rotator.select_key(provider) {
                Ok(key) => key,
                Err(RotationError::NoActiveKey { provider }) => {
                    return Err(JobError::NoActiveKey { provider })
                }
                Err(RotationError::AllExhausted { provider }) => {
                    return Err(JobError::QuotaExhausted {
                        provider,
                        attempts: tried.len(),
                    })
                }
            };
            if !tried.insert(key.index) {
                return Err(JobError::QuotaExhausted {
                    provider,
                    attempts: tried.len(),
                });
            }

            debug!(%provider, key = %key.label, model = %request.model, "dispatching");
            match self.call_with_retries(&client, &key, request, cancel).await {
                Ok(text) => {
                    self.rotator.record_usage(provider, key.index);
                    return Ok(Completion {
                        text,
                        provider,
                        key_label: key.label,
                    });
                }
                Err(ProviderError::RateLimited(message)) => {
                    self.rotator.on_quota_error(provider, key.index);
                    if !self.rotator.policy().auto_switch {
                        return Err(JobError::QuotaExhausted {
                            provider,
                            attempts: tried.len(),
                        });
                    }
                    warn!(%provider, key = %key.label, %message, "quota signal, switching key");
                    self.signals
                        .log(format!("{} hit its quota, trying next key", key.label), None);
                }
                Err(ProviderError::InvalidApiKey(message)) => {
                    return Err(JobError::Auth { provider, message })
                }
                Err(ProviderError::Cancelled) => return Err(JobError::Cancelled),
                Err(ProviderError::Transient(message)) => {
                    return Err(JobError::Transient {
                        message,
                        attempts: self.settings.transient_retries + 1,
                    })
                }
                Err(other) => return Err(JobError::Provider(other.to_string())),
            }
        }
    }

    async fn call_with_retries(
        &self,
        client: &Arc<dyn ProviderClient>,
        key: &SelectedKey,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        let mut attempt = 0;
        loop {
            let result = self
                .call_cancellable(Arc::clone(client), key.secret.clone(), request.clone(), cancel)
                .await;

            match result {
                Err(e) if e.is_transient() && attempt < self.settings.transient_retries => {
                    attempt += 1;
                    let backoff = self.settings.retry_backoff * attempt;
                    info!(error = %e, attempt, backoff_ms = backoff.as_millis() as u64, "retrying");
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
                other => return other,
            }
        }
    }

    /// Run the provider call as its own task so cancellation never waits on
    /// the network. A result arriving after cancellation is discarded.
    async fn call_cancellable(
        &self,
        client: Arc<dyn ProviderClient>,
        secret: String,
        request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let task_token = cancel.child_token();
        let mut handle =
            tokio::spawn(async move { client.generate(&secret, &request, &task_token).await });

        tokio::select! {
            joined = &mut handle => match joined {
                Ok(result) => result,
                Err(e) => Err(ProviderError::Transient(format!("provider task failed: {}", e))),
            },
            _ = cancel.cancelled() => {
                if tokio::time::timeout(self.settings.cancel_grace, &mut handle).await.is_err() {
                    debug!("provider call did not stop within grace period, aborting");
                    handle.abort();
                }
                Err(ProviderError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::key_rotator::RotationPolicy;
    use crate::domain::provider::{ApiKey, RotationMode};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies from a script, recording which key each call used
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        keys_used: Mutex<Vec<String>>,
        delay: Duration,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                keys_used: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            })
        }

        fn keys_used(&self) -> Vec<String> {
            self.keys_used.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProviderClient for ScriptedProvider {
        fn id(&self) -> ProviderId {
            ProviderId::Gemini
        }

        async fn generate(
            &self,
            api_key: &str,
            _request: &GenerationRequest,
            _cancel: &CancellationToken,
        ) -> Result<String, ProviderError> {
            self.keys_used.lock().unwrap().push(api_key.to_string());
            tokio::time::sleep(self.delay).await;
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default".to_string()))
        }
    }

    fn dispatcher(provider: Arc<ScriptedProvider>, keys: &[&str], policy: RotationPolicy) -> Dispatcher {
        let rotator = Arc::new(ApiKeyRotator::new(policy));
        rotator.update_pool(
            ProviderId::Gemini,
            keys.iter().map(|k| ApiKey::new(*k, "")).collect(),
        );
        let (signals, _rx) = SignalBus::channel();
        Dispatcher::new(
            ProviderId::Gemini,
            rotator,
            signals,
            DispatchSettings {
                transient_retries: 2,
                retry_backoff: Duration::from_millis(1),
                cancel_grace: Duration::from_millis(50),
            },
        )
        .with_client(provider, "gemini-2.0-flash")
    }

    fn request() -> GenerationRequest {
        GenerationRequest::text("hi", "gemini-2.0-flash")
    }

    fn quota() -> Result<String, ProviderError> {
        Err(ProviderError::RateLimited("429".into()))
    }

    #[tokio::test]
    async fn quota_on_first_key_fails_over_to_second() {
        let provider = ScriptedProvider::new(vec![quota(), Ok("done".into())]);
        let d = dispatcher(Arc::clone(&provider), &["k1", "k2"], RotationPolicy::default());

        let completion = d
            .dispatch(ProviderId::Gemini, &request(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(completion.text, "done");
        assert_eq!(provider.keys_used(), vec!["k1", "k2"]);
        let keys = d.rotator().snapshot(ProviderId::Gemini);
        assert!(keys[0].usage_timestamps.is_empty());
        assert_eq!(keys[1].usage_timestamps.len(), 1);
    }

    #[tokio::test]
    async fn quota_on_every_key_tries_each_once() {
        let provider = ScriptedProvider::new(vec![quota(), quota(), quota(), quota()]);
        let d = dispatcher(Arc::clone(&provider), &["k1", "k2", "k3"], RotationPolicy::default());

        let err = d
            .dispatch(ProviderId::Gemini, &request(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::QuotaExhausted { attempts: 3, .. }));
        assert_eq!(provider.keys_used(), vec!["k1", "k2", "k3"]);
    }

    #[tokio::test]
    async fn auto_switch_disabled_stops_after_first_key() {
        let provider = ScriptedProvider::new(vec![quota(), Ok("never".into())]);
        let policy = RotationPolicy {
            auto_switch: false,
            ..RotationPolicy::default()
        };
        let d = dispatcher(Arc::clone(&provider), &["k1", "k2"], policy);

        let err = d
            .dispatch(ProviderId::Gemini, &request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::QuotaExhausted { attempts: 1, .. }));
        assert_eq!(provider.keys_used().len(), 1);
    }

    #[tokio::test]
    async fn auth_error_does_not_rotate() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::InvalidApiKey("bad".into()))]);
        let d = dispatcher(Arc::clone(&provider), &["k1", "k2"], RotationPolicy::default());

        let err = d
            .dispatch(ProviderId::Gemini, &request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Auth { .. }));
        assert_eq!(provider.keys_used(), vec!["k1"]);
    }

    #[tokio::test]
    async fn transient_errors_retry_same_key_then_fail() {
        let transient = || Err(ProviderError::Transient("503".into()));
        let provider = ScriptedProvider::new(vec![transient(), transient(), transient()]);
        let d = dispatcher(Arc::clone(&provider), &["k1", "k2"], RotationPolicy::default());

        let err = d
            .dispatch(ProviderId::Gemini, &request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Transient { attempts: 3, .. }));
        assert_eq!(provider.keys_used(), vec!["k1", "k1", "k1"]);
    }

    #[tokio::test]
    async fn transient_then_success() {
        let provider = ScriptedProvider::new(vec![
            Err(ProviderError::Transient("timeout".into())),
            Ok("ok".into()),
        ]);
        let d = dispatcher(Arc::clone(&provider), &["k1"], RotationPolicy::default());
        let completion = d
            .dispatch(ProviderId::Gemini, &request(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(completion.text, "ok");
    }

    #[tokio::test]
    async fn cancellation_returns_promptly() {
        let provider = Arc::new(ScriptedProvider {
            replies: Mutex::new(VecDeque::new()),
            keys_used: Mutex::new(Vec::new()),
            delay: Duration::from_secs(30),
        });
        let d = dispatcher(provider, &["k1"], RotationPolicy::default());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = d
            .dispatch(ProviderId::Gemini, &request(), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn no_keys_is_no_active_key() {
        let provider = ScriptedProvider::new(Vec::new());
        let d = dispatcher(provider, &[], RotationPolicy::default());
        let err = d
            .dispatch(ProviderId::Gemini, &request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::NoActiveKey { .. }));
    }

    #[tokio::test]
    async fn route_prefers_binding_override() {
        let provider = ScriptedProvider::new(Vec::new());
        let d = dispatcher(provider, &["k1"], RotationPolicy {
            mode: RotationMode::Sticky,
            ..RotationPolicy::default()
        });

        let plain = HotkeyBinding::new("Ctrl+F1".parse().unwrap(), "a", "p");
        assert_eq!(
            d.resolve_route(&plain).unwrap(),
            Route {
                provider: ProviderId::Gemini,
                model: "gemini-2.0-flash".into()
            }
        );

        let custom = plain
            .clone()
            .with_override(ProviderId::Gemini, Some("gemini-1.5-pro".into()));
        assert_eq!(d.resolve_route(&custom).unwrap().model, "gemini-1.5-pro");

        let unknown = plain.with_override(ProviderId::OpenAi, None);
        assert!(d.resolve_route(&unknown).is_err());
    }
}
