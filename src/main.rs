//! HotPrompt CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hotprompt::cli::{
    app::{config_store, run_daemon, EXIT_ERROR},
    args::{Cli, Commands},
    check_cmd::handle_check_command,
    config_cmd::handle_config_command,
    keys_cmd::handle_keys_command,
    presenter::Presenter,
};
use hotprompt::domain::provider::ProviderId;

/// `RUST_LOG` wins; otherwise our crate at the CLI level and deps at warn
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hotprompt={},warn", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());
    let presenter = Presenter::new();

    match cli.command {
        None | Some(Commands::Run) => run_daemon(cli.config).await,
        Some(Commands::Config { action }) => {
            let store = config_store(cli.config);
            match handle_config_command(action, &store, &presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        Some(Commands::Keys { action }) => {
            let store = config_store(cli.config);
            match handle_keys_command(action, &store, &presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        Some(Commands::Check { provider }) => {
            let store = config_store(cli.config);
            let provider = provider.map(ProviderId::from);
            match handle_check_command(provider, &store, &presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
    }
}
