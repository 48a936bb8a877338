//! PID file guarding against two running daemons

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;

use nix::sys::signal::kill;
use nix::unistd::Pid;

const PID_FILE_NAME: &str = "hotprompt.pid";

/// PID file for the daemon
pub struct PidFile {
    path: PathBuf,
    owned: bool,
}

impl PidFile {
    /// PID file in the user runtime dir, falling back to the temp dir
    pub fn new() -> Self {
        let dir = dirs::runtime_dir().unwrap_or_else(std::env::temp_dir);
        Self::with_path(dir.join(PID_FILE_NAME))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PID of a live daemon holding the file, if any.
    ///
    /// A stale file (dead process or garbage content) is removed.
    pub fn is_running(&self) -> Option<u32> {
        let contents = fs::read_to_string(&self.path).ok()?;

        let Ok(pid) = contents.trim().parse::<u32>() else {
            let _ = fs::remove_file(&self.path);
            return None;
        };

        // Signal 0 checks for existence without delivering anything
        match kill(Pid::from_raw(pid as i32), None) {
            Ok(()) => Some(pid),
            Err(nix::errno::Errno::ESRCH) => {
                let _ = fs::remove_file(&self.path);
                None
            }
            // EPERM: alive but owned by someone else
            Err(_) => Some(pid),
        }
    }

    /// Acquire the PID file (fails if another daemon is running)
    pub fn acquire(&mut self) -> Result<(), PidFileError> {
        if let Some(pid) = self.is_running() {
            return Err(PidFileError::AlreadyRunning(pid));
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PidFileError::WriteFailed(e.to_string()))?;
        }

        let mut file: File = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    PidFileError::AlreadyRunning(self.is_running().unwrap_or_default())
                }
                _ => PidFileError::WriteFailed(format!("Failed to create PID file: {}", e)),
            })?;

        write!(file, "{}", process::id())
            .map_err(|e| PidFileError::WriteFailed(format!("Failed to write PID: {}", e)))?;

        self.owned = true;
        Ok(())
    }

    /// Release the PID file if this process holds it
    pub fn release(&mut self) -> Result<(), PidFileError> {
        if self.owned && self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                PidFileError::RemoveFailed(format!("Failed to remove PID file: {}", e))
            })?;
        }
        self.owned = false;
        Ok(())
    }
}

impl Default for PidFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

/// PID file errors
#[derive(Debug, thiserror::Error)]
pub enum PidFileError {
    #[error("Another hotprompt daemon is already running (PID: {0})")]
    AlreadyRunning(u32),

    #[error("Failed to write PID file: {0}")]
    WriteFailed(String),

    #[error("Failed to remove PID file: {0}")]
    RemoveFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_path_has_file_name() {
        let pid_file = PidFile::new();
        assert!(pid_file.path().ends_with(PID_FILE_NAME));
    }

    #[test]
    fn nonexistent_file_is_not_running() {
        let dir = TempDir::new().unwrap();
        let pid_file = PidFile::with_path(dir.path().join("none.pid"));
        assert!(pid_file.is_running().is_none());
    }

    #[test]
    fn acquire_writes_own_pid_and_release_removes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.pid");
        let mut pid_file = PidFile::with_path(&path);

        pid_file.acquire().unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, process::id().to_string());

        pid_file.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn second_acquire_reports_running() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.pid");
        let mut first = PidFile::with_path(&path);
        first.acquire().unwrap();

        let mut second = PidFile::with_path(&path);
        assert!(matches!(
            second.acquire(),
            Err(PidFileError::AlreadyRunning(pid)) if pid == process::id()
        ));
        // The loser must not delete the winner's file
        drop(second);
        assert!(path.exists());
    }

    #[test]
    fn garbage_file_is_stale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.pid");
        fs::write(&path, "not-a-pid").unwrap();

        let pid_file = PidFile::with_path(&path);
        assert!(pid_file.is_running().is_none());
        assert!(!path.exists());
    }
}
