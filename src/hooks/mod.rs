//! Init hooks
//!
//! Operator-supplied `*.sh` scripts run by `sh` in file name order:
//! `mysql-pre-init` before the setup-phase daemon starts, `mysql-init`
//! once credentials and replication are in place. A failing script
//! aborts the start.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::observability::{log_event_with_fields, Event};
use crate::supervisor::stdout_stdio;

/// When a group of hooks runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// Before the setup-phase daemon starts
    PreInit,
    /// After credentials and replication, daemon still in setup mode
    Init,
}

impl HookPhase {
    /// Directory name below the hook root
    pub fn dir_name(&self) -> &'static str {
        match self {
            HookPhase::PreInit => "mysql-pre-init",
            HookPhase::Init => "mysql-init",
        }
    }
}

/// Hook failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// Hook directory exists but cannot be listed
    #[error("cannot list hooks in {dir}: {reason}")]
    Unreadable {
        /// Hook directory
        dir: String,
        /// OS error
        reason: String,
    },

    /// `sh` could not be started
    #[error("cannot run hook {script}: {reason}")]
    Spawn {
        /// Script path
        script: String,
        /// OS error
        reason: String,
    },

    /// Script exited unsuccessfully
    #[error("hook {script} failed with {status}")]
    Failed {
        /// Script path
        script: String,
        /// Exit status
        status: String,
    },
}

impl HookError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            HookError::Unreadable { .. } => "MYSQLD_HOOK_UNREADABLE",
            HookError::Spawn { .. } => "MYSQLD_HOOK_SPAWN",
            HookError::Failed { .. } => "MYSQLD_HOOK_FAILED",
        }
    }
}

/// Result type for hooks
pub type HookResult<T> = Result<T, HookError>;

/// Runs hook scripts below a root directory
#[derive(Debug, Clone)]
pub struct HookRunner {
    root: PathBuf,
}

impl HookRunner {
    /// Runner for `<root>/mysql-pre-init` and `<root>/mysql-init`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Scripts for `phase`, sorted. A missing directory has none.
    pub fn scripts(&self, phase: HookPhase) -> HookResult<Vec<PathBuf>> {
        let dir = self.root.join(phase.dir_name());
        let unreadable = |e: io::Error| HookError::Unreadable {
            dir: dir.display().to_string(),
            reason: e.to_string(),
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(unreadable(e)),
        };

        let mut scripts = Vec::new();
        for entry in entries {
            let path = entry.map_err(unreadable)?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("sh") {
                scripts.push(path);
            }
        }
        scripts.sort();
        Ok(scripts)
    }

    /// Run every script for `phase` with `env` added. Returns how many ran.
    pub fn run(&self, phase: HookPhase, env: &[(&str, String)]) -> HookResult<usize> {
        let scripts = self.scripts(phase)?;
        for script in &scripts {
            run_script(script, env)?;
            let script_text = script.display().to_string();
            log_event_with_fields(
                Event::HookExecuted,
                &[("phase", phase.dir_name()), ("script", &script_text)],
            );
        }
        Ok(scripts.len())
    }
}

fn run_script(script: &Path, env: &[(&str, String)]) -> HookResult<()> {
    let name = script.display().to_string();
    let spawn_err = |e: io::Error| HookError::Spawn {
        script: name.clone(),
        reason: e.to_string(),
    };

    let mut command = Command::new("sh");
    command
        .arg(script)
        .stdin(Stdio::null())
        .stdout(stdout_stdio().map_err(spawn_err)?)
        .stderr(stdout_stdio().map_err(spawn_err)?);
    for (key, value) in env {
        command.env(key, value);
    }

    let status = command.status().map_err(spawn_err)?;
    if !status.success() {
        return Err(HookError::Failed {
            script: name,
            status: status.to_string(),
        });
    }
    Ok(())
}
