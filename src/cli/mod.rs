//! Command-line surface: the daemon runner plus the `config`, `keys` and
//! `check` maintenance commands.

pub mod app;
pub mod args;
pub mod check_cmd;
pub mod config_cmd;
pub mod keys_cmd;
#[cfg(unix)]
pub mod pid_file;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{run_daemon, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, KeysAction, ProviderArg};
pub use presenter::Presenter;
