//! First-start engine bootstrap
//!
//! Runs the daemon binary once in initialize mode to create the system
//! tables. The resulting `root@localhost` has no password; credential
//! enforcement takes it from there.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::errors::{DataDirError, DataDirResult};
use crate::observability::{log_event_with_fields, Event};
use crate::supervisor::stdout_stdio;

/// Runs `<daemon> --defaults-file=<doc> --initialize-insecure`
#[derive(Debug, Clone)]
pub struct DataDirBootstrapper {
    daemon_binary: PathBuf,
    defaults_file: PathBuf,
}

impl DataDirBootstrapper {
    /// Bootstrapper for a daemon binary and rendered configuration
    pub fn new(daemon_binary: impl Into<PathBuf>, defaults_file: impl Into<PathBuf>) -> Self {
        Self {
            daemon_binary: daemon_binary.into(),
            defaults_file: defaults_file.into(),
        }
    }

    /// Arguments passed to the daemon binary
    pub fn args(&self) -> Vec<String> {
        vec![
            format!("--defaults-file={}", self.defaults_file.display()),
            "--initialize-insecure".to_string(),
        ]
    }

    /// Create the data directory and initialize it. Blocks until done.
    pub fn bootstrap(&self, data_dir: &Path) -> DataDirResult<()> {
        let path = data_dir.display().to_string();
        fs::create_dir_all(data_dir).map_err(|e| DataDirError::unreadable(&path, e))?;

        log_event_with_fields(Event::DatadirBootstrapStart, &[("datadir", &path)]);

        let binary = self.daemon_binary.display().to_string();
        let stdout = stdout_stdio().map_err(|e| DataDirError::bootstrap_spawn(&binary, e))?;
        let stderr = stdout_stdio().map_err(|e| DataDirError::bootstrap_spawn(&binary, e))?;

        let status = Command::new(&self.daemon_binary)
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(|e| DataDirError::bootstrap_spawn(&binary, e))?;

        if !status.success() {
            return Err(DataDirError::bootstrap_failed(status));
        }

        log_event_with_fields(Event::DatadirBootstrapComplete, &[("datadir", &path)]);
        Ok(())
    }
}
