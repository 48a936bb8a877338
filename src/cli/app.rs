//! Daemon runner: wires adapters into the pipeline and renders its signals

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::ports::{ConfigStore, Notice, Notifier, ProviderError};
use crate::application::{
    ApiKeyRotator, ClipboardTransaction, DispatchSettings, Dispatcher, EventQueue, HotkeyListener,
    HotkeyMatcher, HotkeyRegistry, JobControl, QueueWorker, RotationPolicy, Signal, SignalBus,
    SignalReceiver, TransactionSettings,
};
use crate::domain::config::AppConfig;
use crate::domain::provider::ProviderId;
use crate::infrastructure::{
    create_key_source, create_keystroke, create_notifier, create_provider, ArboardClipboard,
    KeystrokeToolPreference, XdgConfigStore,
};

use super::presenter::Presenter;
use super::signals;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Extra time the worker gets, beyond the cancel grace, to restore the
/// clipboard after shutdown
const SHUTDOWN_SLACK: Duration = Duration::from_secs(1);

/// Config store at `--config` or the default location
pub fn config_store(path: Option<PathBuf>) -> XdgConfigStore {
    match path {
        Some(path) => XdgConfigStore::with_path(path),
        None => XdgConfigStore::new(),
    }
}

/// Rotator seeded with every provider's key pool
pub fn build_rotator(config: &AppConfig) -> Arc<ApiKeyRotator> {
    let rotator = ApiKeyRotator::new(RotationPolicy {
        auto_switch: config.auto_switch_api_keys,
        mode: config.pipeline.rotation_mode,
        quota_cooldown: config.pipeline.quota_cooldown(),
    });
    for provider in ProviderId::ALL {
        rotator.update_pool(provider, config.providers.get(provider).api_keys.clone());
    }
    Arc::new(rotator)
}

/// Dispatcher with a client for every provider
pub fn build_dispatcher(
    config: &AppConfig,
    rotator: Arc<ApiKeyRotator>,
    signals: SignalBus,
) -> Result<Dispatcher, ProviderError> {
    let settings = DispatchSettings {
        transient_retries: config.pipeline.transient_retries,
        retry_backoff: config.pipeline.retry_backoff(),
        cancel_grace: config.pipeline.cancel_grace(),
    };

    let mut dispatcher = Dispatcher::new(config.provider, rotator, signals, settings);
    for provider in ProviderId::ALL {
        let provider_settings = config.providers.get(provider);
        let client = create_provider(provider, provider_settings, &config.proxy)?;
        dispatcher =
            dispatcher.with_client(client, provider_settings.model().unwrap_or_default());
    }
    Ok(dispatcher)
}

/// Copy usage history from the rotator into the stored key entries.
///
/// Entries are matched by secret so keys edited while the daemon ran are
/// left alone.
pub async fn persist_usage<S: ConfigStore>(
    store: &S,
    rotator: &ApiKeyRotator,
) -> Result<(), crate::domain::error::ConfigError> {
    let mut config = store.load().await?;
    for provider in ProviderId::ALL {
        let snapshot = rotator.snapshot(provider);
        for stored in &mut config.providers.get_mut(provider).api_keys {
            if let Some(live) = snapshot.iter().find(|k| k.key == stored.key) {
                stored.usage_timestamps = live.usage_timestamps.clone();
            }
        }
    }
    store.save(&config).await
}

/// Run the hotkey daemon until SIGINT/SIGTERM
pub async fn run_daemon(config_path: Option<PathBuf>) -> ExitCode {
    let presenter = Presenter::new();
    let store = config_store(config_path);

    let config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };
    if let Err(e) = config.validate() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    #[cfg(unix)]
    let mut pid_file = super::pid_file::PidFile::new();
    #[cfg(unix)]
    if let Err(e) = pid_file.acquire() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let result = run_pipeline(&store, config, &presenter).await;

    #[cfg(unix)]
    if let Err(e) = pid_file.release() {
        warn!(error = %e, "failed to remove pid file");
    }

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(message) => {
            presenter.error(&message);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run_pipeline(
    store: &XdgConfigStore,
    config: AppConfig,
    presenter: &Presenter,
) -> Result<(), String> {
    let bindings = config.bindings().map_err(|e| e.to_string())?;
    let cancel_combination = config.cancel_combination().map_err(|e| e.to_string())?;

    let (bus, receiver) = SignalBus::channel();
    let rotator = build_rotator(&config);
    let dispatcher = build_dispatcher(&config, Arc::clone(&rotator), bus.clone())
        .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

    let preference: KeystrokeToolPreference =
        config.keystroke_tool.parse().map_err(|e| format!("{}", e))?;
    let (keystroke, tool) = create_keystroke(preference)
        .await
        .map_err(|e| e.to_string())?;
    debug!(%tool, "keystroke tool selected");

    let transaction = ClipboardTransaction::new(
        ArboardClipboard::new(),
        keystroke,
        TransactionSettings {
            capture_attempts: config.pipeline.capture_attempts,
            capture_backoff: config.pipeline.capture_backoff(),
            settle_delay: config.pipeline.settle_delay(),
        },
    );
    let simulation = transaction.simulation_flag();

    let control = Arc::new(JobControl::default());
    let queue = Arc::new(EventQueue::new(config.pipeline.queue_capacity));
    let shutdown = CancellationToken::new();

    signals::install(shutdown.clone(), Arc::clone(&control))
        .map_err(|e| format!("Failed to setup signal handler: {}", e))?;

    let registry = Arc::new(HotkeyRegistry::new());
    let matcher = Arc::new(
        HotkeyMatcher::new(
            registry,
            Arc::clone(&queue),
            simulation,
            Arc::clone(&control),
        )
        .with_cancel_combination(cancel_combination.clone()),
    );
    let listener = HotkeyListener::new(create_key_source(), matcher);

    let labels: Vec<String> = bindings.iter().map(|b| b.label()).collect();
    listener
        .start(bindings)
        .map_err(|e| format!("Failed to start hotkey listener: {}", e))?;

    let worker = Arc::new(QueueWorker::new(
        transaction,
        dispatcher,
        bus,
        Arc::clone(&control),
    ));
    let worker_handle = {
        let worker = Arc::clone(&worker);
        let queue = Arc::clone(&queue);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { worker.run(queue, shutdown).await })
    };

    presenter.daemon_status(&format!(
        "Listening with {} ({})",
        config.provider,
        config.active_provider().model().unwrap_or("no model")
    ));
    for label in &labels {
        presenter.info(label);
    }
    if let Some(cancel) = &cancel_combination {
        presenter.info(&format!("{} cancels the running job", cancel));
    }
    info!(pid = std::process::id(), "daemon started");

    let notifier = config.notify.then(create_notifier);
    let mut receiver = receiver;
    consume_signals(
        &mut receiver,
        &shutdown,
        presenter,
        notifier.as_deref(),
        store,
        &rotator,
    )
    .await;

    listener.stop();
    queue.close();

    let grace = config.pipeline.cancel_grace() + SHUTDOWN_SLACK;
    if tokio::time::timeout(grace, worker_handle).await.is_err() {
        warn!("worker did not stop in time");
    }

    // Render whatever the worker emitted while winding down
    while let Ok(signal) = receiver.try_recv() {
        presenter.signal(&signal);
    }
    presenter.daemon_status("Stopped");
    Ok(())
}

/// Render signals until shutdown
async fn consume_signals<S: ConfigStore>(
    receiver: &mut SignalReceiver,
    shutdown: &CancellationToken,
    presenter: &Presenter,
    notifier: Option<&dyn Notifier>,
    store: &S,
    rotator: &ApiKeyRotator,
) {
    loop {
        let signal = tokio::select! {
            _ = shutdown.cancelled() => break,
            signal = receiver.recv() => match signal {
                Some(signal) => signal,
                None => break,
            },
        };

        presenter.signal(&signal);

        let notice = match &signal {
            Signal::JobSucceeded { label, elapsed_secs } => {
                if let Err(e) = persist_usage(store, rotator).await {
                    warn!(error = %e, "failed to persist key usage");
                }
                Some(Notice::job_succeeded(label, *elapsed_secs))
            }
            Signal::JobFailed {
                label,
                kind,
                message,
            } => Some(Notice::job_failed(label, *kind, message)),
            _ => None,
        };

        if let (Some(notifier), Some(notice)) = (notifier, notice) {
            if let Err(e) = notifier.show(&notice).await {
                debug!(error = %e, "notification failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::ApiKey;
    use tempfile::TempDir;

    #[test]
    fn rotator_gets_every_pool() {
        let mut config = AppConfig::defaults();
        config.providers.openai.api_keys = vec![ApiKey::new("sk-a", "A")];
        let rotator = build_rotator(&config);

        assert_eq!(rotator.snapshot(ProviderId::OpenAi).len(), 1);
        assert_eq!(rotator.snapshot(ProviderId::Gemini).len(), 1);
    }

    #[test]
    fn dispatcher_builds_without_network() {
        let config = AppConfig::defaults();
        let (bus, _rx) = SignalBus::channel();
        assert!(build_dispatcher(&config, build_rotator(&config), bus).is_ok());
    }

    #[tokio::test]
    async fn usage_is_copied_by_secret() {
        let dir = TempDir::new().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));

        let mut config = AppConfig::defaults();
        config.providers.gemini.api_keys = vec![ApiKey::new("k1", "One"), ApiKey::new("k2", "Two")];
        store.save(&config).await.unwrap();

        let rotator = build_rotator(&config);
        let key = rotator.select_key(ProviderId::Gemini).unwrap();
        rotator.record_usage(ProviderId::Gemini, key.index);

        persist_usage(&store, &rotator).await.unwrap();

        let saved = store.load().await.unwrap();
        let used: Vec<usize> = saved
            .providers
            .gemini
            .api_keys
            .iter()
            .map(|k| k.usage_timestamps.len())
            .collect();
        assert_eq!(used, vec![1, 0]);
    }
}
