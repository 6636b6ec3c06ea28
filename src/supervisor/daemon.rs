//! Long-lived daemon supervision
//!
//! The daemon runs as our child for the rest of the container's life.
//! A termination signal is forwarded as SIGTERM; if the daemon has not
//! exited when the grace period ends it is killed. Our exit code is the
//! daemon's.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};

use super::errors::{SupervisorError, SupervisorResult};
use super::output::{exit_code, stdout_stdio};
use super::shutdown::ShutdownSignal;
use crate::observability::{log_event_with_fields, Event};

/// Variables removed from the daemon's environment
pub const SCRUBBED_ENV: [&str; 6] = [
    "MYSQL_PASSWORD",
    "MYSQL_ROOT_PASSWORD",
    "MYSQL_MASTER_PASSWORD",
    "MYSQL_USER",
    "MYSQL_MASTER_USER",
    "MYSQL_DATABASE",
];

/// Default grace period between forwarding a signal and killing
pub const DEFAULT_GRACE: Duration = Duration::from_secs(30);

/// Supervises one foreground daemon process
#[derive(Debug, Clone)]
pub struct DaemonSupervisor {
    binary: PathBuf,
    args: Vec<String>,
    grace: Duration,
}

impl DaemonSupervisor {
    /// Supervisor for an arbitrary program
    pub fn new(binary: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
            grace: DEFAULT_GRACE,
        }
    }

    /// Supervisor for the database daemon reading `defaults_file`
    pub fn for_daemon(binary: impl Into<PathBuf>, defaults_file: &Path) -> Self {
        Self::new(
            binary,
            vec![format!("--defaults-file={}", defaults_file.display())],
        )
    }

    /// Replace the grace period
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Arguments passed to the program
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn spawn(&self) -> SupervisorResult<Child> {
        let name = self.binary.display().to_string();
        let spawn_err = |e: std::io::Error| SupervisorError::Spawn {
            binary: name.clone(),
            reason: e.to_string(),
        };

        let mut command = Command::new(&self.binary);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(stdout_stdio().map_err(spawn_err)?)
            .stderr(stdout_stdio().map_err(spawn_err)?)
            .kill_on_drop(true);
        for var in SCRUBBED_ENV {
            command.env_remove(var);
        }
        command.spawn().map_err(spawn_err)
    }

    /// Run the program to completion and return its exit code
    pub async fn run(&self, mut shutdown: ShutdownSignal) -> SupervisorResult<i32> {
        let mut child = self.spawn()?;
        let pid = child.id().unwrap_or_default();
        let pid_text = pid.to_string();
        let binary = self.binary.display().to_string();
        log_event_with_fields(
            Event::DaemonStart,
            &[("pid", &pid_text), ("binary", &binary)],
        );

        let status = tokio::select! {
            status = child.wait() => status.map_err(|e| SupervisorError::io("wait for daemon", e))?,
            received = shutdown.recv() => {
                let received_text = received.to_string();
                log_event_with_fields(
                    Event::SignalForwarded,
                    &[("pid", &pid_text), ("signal", &received_text)],
                );
                if pid != 0 {
                    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                        // ESRCH: already gone, the wait below reaps it
                        if e != nix::errno::Errno::ESRCH {
                            return Err(SupervisorError::io("forward signal", e));
                        }
                    }
                }
                self.await_exit(&mut child, &pid_text).await?
            }
        };

        let code = exit_code(status);
        let code_text = code.to_string();
        log_event_with_fields(
            Event::DaemonExited,
            &[("pid", &pid_text), ("code", &code_text)],
        );
        Ok(code)
    }

    async fn await_exit(
        &self,
        child: &mut Child,
        pid_text: &str,
    ) -> SupervisorResult<std::process::ExitStatus> {
        match tokio::time::timeout(self.grace, child.wait()).await {
            Ok(status) => status.map_err(|e| SupervisorError::io("wait for daemon", e)),
            Err(_) => {
                let grace = format!("{}s", self.grace.as_secs());
                log_event_with_fields(
                    Event::DaemonKilled,
                    &[("pid", pid_text), ("grace", &grace)],
                );
                child
                    .start_kill()
                    .map_err(|e| SupervisorError::io("kill daemon", e))?;
                child
                    .wait()
                    .await
                    .map_err(|e| SupervisorError::io("wait for daemon", e))
            }
        }
    }
}
