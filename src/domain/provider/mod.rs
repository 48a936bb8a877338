//! Provider domain module

mod api_key;
mod proxy;

pub use api_key::{mask_secret, now_unix, ApiKey, USAGE_WINDOW_SECS};
pub use proxy::{ProxyConfig, ProxyKind};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidProviderError;

/// AI backend identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Google Gemini (native text + vision)
    #[default]
    Gemini,
    /// Any chat-completions compatible endpoint (OpenAI, OpenRouter, ...)
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::Gemini, ProviderId::OpenAi];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = InvalidProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "openai-compatible" | "openrouter" => Ok(Self::OpenAi),
            _ => Err(InvalidProviderError {
                input: s.to_string(),
            }),
        }
    }
}

/// How the key cursor moves between successful calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Advance to the next key after every successful call
    #[default]
    RoundRobin,
    /// Keep using the current key until a quota signal
    Sticky,
}
