//! Shared runner for command-line key injection tools

use std::process::Stdio;

use tokio::process::Command;

use crate::application::ports::{Chord, KeystrokeError};

/// Run `program args..` and map spawn/exit failures for `chord`
pub(super) async fn run_tool(
    program: &'static str,
    args: &[&str],
    chord: Chord,
) -> Result<(), KeystrokeError> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KeystrokeError::ToolNotFound(program)
            } else {
                KeystrokeError::SendFailed {
                    chord,
                    message: e.to_string(),
                }
            }
        })?;

    if !status.success() {
        return Err(KeystrokeError::SendFailed {
            chord,
            message: format!("{} exited with status: {}", program, status),
        });
    }

    Ok(())
}
