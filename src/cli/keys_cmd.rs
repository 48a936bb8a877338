//! Key management command handler

use crate::application::ports::ConfigStore;
use crate::domain::error::ConfigError;
use crate::domain::provider::{ApiKey, ProviderId};

use super::app::build_rotator;
use super::args::KeysAction;
use super::presenter::Presenter;

/// Handle keys subcommand
pub async fn handle_keys_command<S: ConfigStore>(
    action: KeysAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        KeysAction::List { provider } => {
            let config = store.load().await?;
            let provider = provider.map(ProviderId::from).unwrap_or(config.provider);
            let rotator = build_rotator(&config);
            presenter.key_table(provider.as_str(), &rotator.status(provider));
            Ok(())
        }
        KeysAction::Add {
            provider,
            key,
            label,
        } => {
            let provider = ProviderId::from(provider);
            let mut config = store.load().await?;
            let keys = &mut config.providers.get_mut(provider).api_keys;
            let label = add_key(keys, &key, label)?;
            store.save(&config).await?;
            presenter.success(&format!("Added {} key \"{}\"", provider, label));
            Ok(())
        }
    }
}

/// Append a key, dropping placeholder entries. Returns the label used.
fn add_key(keys: &mut Vec<ApiKey>, secret: &str, label: Option<String>) -> Result<String, ConfigError> {
    let secret = secret.trim();
    let candidate = ApiKey::new(secret, "");
    if !candidate.is_configured() {
        return Err(ConfigError::invalid("key", "Key is empty or a placeholder"));
    }
    if keys.iter().any(|k| k.key == secret) {
        return Err(ConfigError::invalid("key", "Key is already configured"));
    }

    keys.retain(ApiKey::is_configured);
    let label = label
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| format!("Key {}", keys.len() + 1));
    keys.push(ApiKey::new(secret, label.clone()));
    Ok(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_replaces_placeholder() {
        let mut keys = vec![ApiKey::new("YOUR_API_KEY_HERE", "Main Key")];
        let label = add_key(&mut keys, "AIza-real-key", None).unwrap();

        assert_eq!(label, "Key 1");
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].key, "AIza-real-key");
    }

    #[test]
    fn add_keeps_existing_keys_and_label() {
        let mut keys = vec![ApiKey::new("k-one-secret", "One")];
        add_key(&mut keys, "k-two-secret", Some("Work".to_string())).unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].label, "Work");
        assert!(keys[1].active);
    }

    #[test]
    fn add_rejects_duplicates_and_placeholders() {
        let mut keys = vec![ApiKey::new("k-one-secret", "One")];
        assert!(add_key(&mut keys, "k-one-secret", None).is_err());
        assert!(add_key(&mut keys, "YOUR_KEY", None).is_err());
        assert!(add_key(&mut keys, "   ", None).is_err());
        assert_eq!(keys.len(), 1);
    }
}
