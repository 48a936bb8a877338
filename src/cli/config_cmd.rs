//! Config command handler

use toml::Table;

use crate::application::ports::ConfigStore;
use crate::domain::config::document::{flatten, from_table, get_path, set_path};
use crate::domain::error::ConfigError;
use crate::domain::provider::mask_secret;
use crate::infrastructure::{KeystrokeToolPreference, XdgConfigStore};

use super::args::ConfigAction;
use super::presenter::Presenter;

/// Handle config subcommand
pub async fn handle_config_command(
    action: ConfigAction,
    store: &XdgConfigStore,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init(store: &XdgConfigStore, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set(
    store: &XdgConfigStore,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let mut document = store.load_effective_document().await?;
    set_path(&mut document, key, value)?;
    validate_document(&document, key)?;

    store.save_document(&document).await?;
    presenter.success(&format!("{} = {}", key, display_value(key, value)));
    Ok(())
}

async fn handle_get(
    store: &XdgConfigStore,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    let document = store.load_effective_document().await?;

    let value = get_path(&document, key)
        .ok_or_else(|| ConfigError::invalid(key, "Unknown key"))?;

    match value {
        toml::Value::String(s) => presenter.output(&display_value(key, s)),
        toml::Value::Table(_) | toml::Value::Array(_) => {
            let mut wrapper = Table::new();
            wrapper.insert(key.to_string(), value.clone());
            for (path, value) in flatten(&wrapper) {
                presenter.key_value(&path, &display_value(&path, &value));
            }
        }
        other => presenter.output(&other.to_string()),
    }
    Ok(())
}

async fn handle_list(store: &XdgConfigStore, presenter: &Presenter) -> Result<(), ConfigError> {
    let document = store.load_effective_document().await?;
    for (path, value) in flatten(&document) {
        presenter.key_value(&path, &display_value(&path, &value));
    }
    Ok(())
}

fn handle_path(store: &XdgConfigStore, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

/// Reject documents the daemon would refuse to start with
fn validate_document(document: &Table, key: &str) -> Result<(), ConfigError> {
    let config = from_table(document.clone()).map_err(|e| match e {
        ConfigError::ParseError(message) => ConfigError::invalid(key, message),
        other => other,
    })?;
    config.validate()?;
    config
        .keystroke_tool
        .parse::<KeystrokeToolPreference>()
        .map_err(|e| ConfigError::invalid("keystroke_tool", e.to_string()))?;
    Ok(())
}

/// Secrets (API key values, proxy credentials) are shown masked
fn display_value(path: &str, value: &str) -> String {
    if is_secret_path(path) {
        mask_secret(value)
    } else {
        value.to_string()
    }
}

fn is_secret_path(path: &str) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    let in_key_list = segments.contains(&"api_keys") && segments.last() == Some(&"key");
    in_key_list || path == "proxy.connection_string"
}
