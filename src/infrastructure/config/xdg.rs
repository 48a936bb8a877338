//! XDG config store adapter

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use toml::Table;

use crate::application::ports::ConfigStore;
use crate::domain::config::document::{from_table, merge_tables, merged_with_defaults, to_table};
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// XDG-compliant config store
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    /// Create a new XDG config store with default path
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("hotprompt");

        Self {
            path: config_dir.join("config.toml"),
        }
    }

    /// Create with custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse TOML content into a raw document
    fn parse_document(content: &str) -> Result<Table, ConfigError> {
        content
            .parse::<Table>()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Read the stored document as written, without defaults.
    ///
    /// A missing file reads as an empty document.
    pub async fn load_document(&self) -> Result<Table, ConfigError> {
        if !self.exists() {
            return Ok(Table::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Self::parse_document(&content)
    }

    /// The stored document merged over defaults
    pub async fn load_effective_document(&self) -> Result<Table, ConfigError> {
        merged_with_defaults(&self.load_document().await?)
    }

    /// Write a raw document, replacing the file atomically
    pub async fn save_document(&self, document: &Table) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let content =
            toml::to_string_pretty(document).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        let merged = self.load_effective_document().await?;
        from_table(merged)
    }

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        // Overlay onto what is on disk so unknown keys survive
        let mut document = self.load_document().await?;
        merge_tables(&mut document, &to_table(config)?);
        self.save_document(&document).await
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path.to_string_lossy().to_string(),
            ));
        }

        let defaults = AppConfig::defaults();
        self.save(&defaults).await
    }
}
