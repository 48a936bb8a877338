//! Configuration domain module

mod app_config;
pub mod document;

pub use app_config::{
    AppConfig, HotkeyConfig, PipelineConfig, ProviderSettings, ProvidersConfig, GEMINI_BASE_URL,
    OPENAI_BASE_URL,
};
