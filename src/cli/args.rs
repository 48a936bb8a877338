//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::provider::ProviderId;

/// HotPrompt - replace the current selection with AI output from a hotkey
#[derive(Parser, Debug)]
#[command(name = "hotprompt")]
#[command(version)]
#[command(about = "Send the current selection to an AI provider from a global hotkey")]
#[command(long_about = None)]
pub struct Cli {
    /// Use a config file other than the default location
    #[arg(long, global = true, value_name = "PATH", env = "HOTPROMPT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show debug logs
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Log level implied by the verbosity flags
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start listening for hotkeys (default)
    Run,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage provider API keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
    /// Test every key of a provider with a tiny prompt
    Check {
        /// Provider to test (defaults to the active provider)
        provider: Option<ProviderArg>,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value (dotted path, e.g. pipeline.capture_attempts)
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Key management subcommands
#[derive(Subcommand, Debug)]
pub enum KeysAction {
    /// Show keys with status and 24h usage
    List {
        /// Provider to list (defaults to the active provider)
        provider: Option<ProviderArg>,
    },
    /// Add a key to a provider's pool
    Add {
        provider: ProviderArg,
        /// The secret
        key: String,
        /// Display label
        #[arg(long)]
        label: Option<String>,
    },
}

/// Provider argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    Gemini,
    #[value(alias = "openrouter")]
    Openai,
}

impl From<ProviderArg> for ProviderId {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Gemini => ProviderId::Gemini,
            ProviderArg::Openai => ProviderId::OpenAi,
        }
    }
}
