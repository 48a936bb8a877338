//! Configuration storage port

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Persistent home of the configuration document.
///
/// `load` always yields a complete config: the stored document merged over
/// built-in defaults, or the defaults alone when nothing is stored yet.
/// `save` merges the typed config back over the stored document, so keys this
/// version does not understand survive the round-trip.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    fn path(&self) -> PathBuf;

    fn exists(&self) -> bool;

    /// Write the default document; refuses to overwrite an existing file
    async fn init(&self) -> Result<(), ConfigError>;
}
