//! API credential entity

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Usage timestamps older than this are trimmed
pub const USAGE_WINDOW_SECS: f64 = 24.0 * 60.0 * 60.0;

/// Current wall-clock time as fractional unix seconds
pub fn now_unix() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn default_active() -> bool {
    true
}

/// One credential in a provider's key pool.
///
/// Missing fields in older config documents fall back to the serde defaults;
/// fields this version does not know are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub usage_timestamps: Vec<f64>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl ApiKey {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            active: true,
            usage_timestamps: Vec::new(),
            extra: toml::Table::new(),
        }
    }

    /// Whether the key holds a usable secret (not blank, not a placeholder)
    pub fn is_configured(&self) -> bool {
        let key = self.key.trim();
        !key.is_empty() && !key.contains("YOUR_")
    }

    /// Label for display, falling back to the position in the pool
    pub fn display_label(&self, index: usize) -> String {
        if self.label.trim().is_empty() {
            format!("Key {}", index + 1)
        } else {
            self.label.clone()
        }
    }

    /// Append a usage timestamp and drop entries outside the window
    pub fn record_usage(&mut self, now: f64) {
        self.usage_timestamps.push(now);
        self.trim_usage(now);
    }

    /// Drop usage timestamps older than the 24h window
    pub fn trim_usage(&mut self, now: f64) {
        self.usage_timestamps
            .retain(|ts| now - ts < USAGE_WINDOW_SECS);
    }

    /// Number of uses inside the window
    pub fn usage_count(&self, now: f64) -> usize {
        self.usage_timestamps
            .iter()
            .filter(|ts| now - **ts < USAGE_WINDOW_SECS)
            .count()
    }

    /// Masked secret for display (`sk-1...9xyz`)
    pub fn masked(&self) -> String {
        mask_secret(&self.key)
    }
}

/// Mask all but the edges of a secret
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
