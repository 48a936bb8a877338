//! Application configuration value object

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::{ConfigError, InvalidProviderError, KeyComboParseError};
use crate::domain::hotkey::{HotkeyBinding, KeyCombination};
use crate::domain::provider::{ApiKey, ProviderId, ProxyConfig, RotationMode};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const OPENAI_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Timing and retry knobs for the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub capture_attempts: u32,
    pub capture_backoff_ms: u64,
    pub settle_delay_ms: u64,
    pub transient_retries: u32,
    pub retry_backoff_ms: u64,
    pub cancel_grace_ms: u64,
    pub queue_capacity: usize,
    pub quota_cooldown_secs: u64,
    pub rotation_mode: RotationMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capture_attempts: 3,
            capture_backoff_ms: 100,
            settle_delay_ms: 100,
            transient_retries: 2,
            retry_backoff_ms: 500,
            cancel_grace_ms: 2000,
            queue_capacity: 4,
            quota_cooldown_secs: 60,
            rotation_mode: RotationMode::RoundRobin,
        }
    }
}

impl PipelineConfig {
    pub fn capture_backoff(&self) -> Duration {
        Duration::from_millis(self.capture_backoff_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }

    pub fn quota_cooldown(&self) -> Duration {
        Duration::from_secs(self.quota_cooldown_secs)
    }
}

/// Keys, models and endpoint of one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub active_model: String,
    #[serde(default)]
    pub base_url: String,
}

impl ProviderSettings {
    /// Active model, falling back to the first listed one
    pub fn model(&self) -> Option<&str> {
        if !self.active_model.trim().is_empty() {
            Some(self.active_model.as_str())
        } else {
            self.models.first().map(String::as_str)
        }
    }
}

/// Per-provider sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: ProviderSettings,
    pub openai: ProviderSettings,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            gemini: ProviderSettings {
                api_keys: vec![ApiKey::new("YOUR_API_KEY_HERE", "Main Key")],
                models: vec![
                    "gemini-2.0-flash".to_string(),
                    "gemini-1.5-pro".to_string(),
                    "gemini-1.5-flash".to_string(),
                ],
                active_model: "gemini-2.0-flash".to_string(),
                base_url: GEMINI_BASE_URL.to_string(),
            },
            openai: ProviderSettings {
                api_keys: Vec::new(),
                models: vec![
                    "deepseek/deepseek-chat".to_string(),
                    "anthropic/claude-3.5-sonnet".to_string(),
                    "openai/gpt-4o".to_string(),
                ],
                active_model: "deepseek/deepseek-chat".to_string(),
                base_url: OPENAI_BASE_URL.to_string(),
            },
        }
    }
}

impl ProvidersConfig {
    pub fn get(&self, id: ProviderId) -> &ProviderSettings {
        match id {
            ProviderId::Gemini => &self.gemini,
            ProviderId::OpenAi => &self.openai,
        }
    }

    pub fn get_mut(&mut self, id: ProviderId) -> &mut ProviderSettings {
        match id {
            ProviderId::Gemini => &mut self.gemini,
            ProviderId::OpenAi => &mut self.openai,
        }
    }
}

fn default_log_color() -> String {
    "#FFFFFF".to_string()
}

/// A hotkey entry as stored in the config document.
///
/// Keys this version does not know are kept in `extra` and written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    pub combination: String,
    pub name: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_log_color")]
    pub log_color: String,
    #[serde(default)]
    pub use_custom_model: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_model: Option<String>,
    /// Follow each text job with an explanation of the changes
    #[serde(default)]
    pub learning_mode: bool,
    /// Explanation template; empty uses the built-in one
    #[serde(default)]
    pub learning_prompt: String,
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl HotkeyConfig {
    fn new(combination: &str, name: &str, prompt: &str, log_color: &str) -> Self {
        Self {
            combination: combination.to_string(),
            name: name.to_string(),
            prompt: prompt.to_string(),
            log_color: log_color.to_string(),
            use_custom_model: false,
            custom_provider: None,
            custom_model: None,
            learning_mode: false,
            learning_prompt: String::new(),
            extra: toml::Table::new(),
        }
    }
}

impl TryFrom<&HotkeyConfig> for HotkeyBinding {
    type Error = ConfigError;

    fn try_from(entry: &HotkeyConfig) -> Result<Self, Self::Error> {
        let combination: KeyCombination = entry
            .combination
            .parse()
            .map_err(|e: KeyComboParseError| {
                ConfigError::invalid(format!("hotkeys.{}", entry.name), e.to_string())
            })?;

        let mut binding = HotkeyBinding::new(combination, &entry.name, &entry.prompt);
        binding.log_color = entry.log_color.clone();

        if entry.use_custom_model {
            let provider = match entry.custom_provider.as_deref() {
                Some(p) => p.parse().map_err(|e: InvalidProviderError| {
                    ConfigError::invalid(format!("hotkeys.{}", entry.name), e.to_string())
                })?,
                None => ProviderId::default(),
            };
            let model = entry
                .custom_model
                .clone()
                .filter(|m| !m.trim().is_empty());
            binding = binding.with_override(provider, model);
        }

        if entry.learning_mode {
            binding = binding.with_learning(entry.learning_prompt.trim());
        }

        Ok(binding)
    }
}

/// Application configuration.
///
/// Every field carries a default so partial documents deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderId,
    pub auto_switch_api_keys: bool,
    pub notify: bool,
    pub keystroke_tool: String,
    /// Empty disables the cancel hotkey
    pub cancel_combination: String,
    pub pipeline: PipelineConfig,
    pub proxy: ProxyConfig,
    pub providers: ProvidersConfig,
    pub hotkeys: Vec<HotkeyConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            provider: ProviderId::Gemini,
            auto_switch_api_keys: true,
            notify: false,
            keystroke_tool: "enigo".to_string(),
            cancel_combination: String::new(),
            pipeline: PipelineConfig::default(),
            proxy: ProxyConfig::default(),
            providers: ProvidersConfig::default(),
            hotkeys: vec![
                HotkeyConfig::new(
                    "Ctrl+F1",
                    "Text Correction",
                    "Fix grammar and spelling. Correct any typos, grammatical errors, and \
                     punctuation issues in the following text while maintaining its original \
                     meaning and style. Only provide the corrected text, nothing else.",
                    "#FFFFFF",
                ),
                HotkeyConfig::new(
                    "Ctrl+F2",
                    "Translation",
                    "Translate to English. Provide only the translation, nothing else.",
                    "#FBB6CE",
                ),
            ],
        }
    }

    /// Parse all hotkey entries into bindings, in document order
    pub fn bindings(&self) -> Result<Vec<HotkeyBinding>, ConfigError> {
        self.hotkeys.iter().map(HotkeyBinding::try_from).collect()
    }

    /// Parsed cancel combination, None when disabled
    pub fn cancel_combination(&self) -> Result<Option<KeyCombination>, ConfigError> {
        let raw = self.cancel_combination.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse()
            .map(Some)
            .map_err(|e: KeyComboParseError| {
                ConfigError::invalid("cancel_combination", e.to_string())
            })
    }

    /// Settings of the active provider
    pub fn active_provider(&self) -> &ProviderSettings {
        self.providers.get(self.provider)
    }

    /// Check values that serde alone cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bindings()?;
        self.cancel_combination()?;
        if self.pipeline.capture_attempts == 0 {
            return Err(ConfigError::invalid(
                "pipeline.capture_attempts",
                "must be at least 1",
            ));
        }
        if self.pipeline.queue_capacity == 0 {
            return Err(ConfigError::invalid(
                "pipeline.queue_capacity",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
