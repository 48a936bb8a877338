//! Domain error types

use thiserror::Error;

/// Error when parsing a key combination string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyComboParseError {
    #[error("Empty key combination. Expected keys joined with '+' (e.g., Ctrl+F1, Ctrl+Shift+T)")]
    Empty,

    #[error("Unknown key: \"{0}\"")]
    UnknownKey(String),

    #[error("Key listed twice in combination: {0}")]
    DuplicateKey(String),
}

/// Error when an invalid provider ID is provided
#[derive(Debug, Clone, Error)]
#[error("Invalid provider: \"{input}\". Valid providers are: gemini, openai")]
pub struct InvalidProviderError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            key: key.into(),
            message: message.into(),
        }
    }
}
