//! OS signal handling for the daemon

use std::sync::Arc;

use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::JobControl;

/// What a received OS signal asks the daemon to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonSignal {
    /// Cancel the in-flight job (SIGUSR1)
    CancelJob,
    /// Shutdown daemon (SIGINT/SIGTERM)
    Shutdown,
}

/// Apply a signal to the running daemon
pub fn apply(signal: DaemonSignal, shutdown: &CancellationToken, control: &JobControl) {
    match signal {
        DaemonSignal::Shutdown => shutdown.cancel(),
        DaemonSignal::CancelJob => {
            if control.cancel_current() {
                info!("in-flight job cancelled by signal");
            } else {
                info!("cancel requested but no job is running");
            }
        }
    }
}

/// Install handlers that feed `apply` until shutdown
#[cfg(unix)]
pub fn install(shutdown: CancellationToken, control: Arc<JobControl>) -> Result<(), std::io::Error> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sigint.recv() => {
                    eprintln!("{} Received SIGINT (shutdown)", "↓".cyan());
                    DaemonSignal::Shutdown
                }
                _ = sigterm.recv() => {
                    eprintln!("{} Received SIGTERM (shutdown)", "↓".cyan());
                    DaemonSignal::Shutdown
                }
                _ = sigusr1.recv() => DaemonSignal::CancelJob,
            };
            apply(received, &shutdown, &control);
        }
    });

    Ok(())
}

#[cfg(not(unix))]
pub fn install(shutdown: CancellationToken, control: Arc<JobControl>) -> Result<(), std::io::Error> {
    let _ = control;
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{} Received Ctrl+C (shutdown)", "↓".cyan());
            shutdown.cancel();
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_cancels_token() {
        let token = CancellationToken::new();
        let control = JobControl::default();
        apply(DaemonSignal::Shutdown, &token, &control);
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_job_trips_current_job_only() {
        let shutdown = CancellationToken::new();
        let control = JobControl::default();
        let job = shutdown.child_token();
        control.install(job.clone());

        apply(DaemonSignal::CancelJob, &shutdown, &control);

        assert!(job.is_cancelled());
        assert!(!shutdown.is_cancelled());
    }
}
