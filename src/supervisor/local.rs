//! Setup-phase daemon
//!
//! A short-lived daemon with networking disabled, reachable only over the
//! admin socket. Credentials and replication are reconciled against it
//! before the real daemon opens the network port.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use super::errors::{SupervisorError, SupervisorResult};
use super::output::{exit_code, stdout_stdio};
use super::shutdown::ShutdownSignal;
use crate::admin::{AdminResult, AdminSession};
use crate::observability::{log_event_with_fields, Event};

const READY_POLL: Duration = Duration::from_millis(250);

/// A running setup-phase daemon
///
/// Dropping it without [`LocalDaemon::stop`] sends SIGTERM and kills the
/// process if it outlives the grace period.
#[derive(Debug)]
pub struct LocalDaemon {
    child: Option<Child>,
    socket: PathBuf,
    grace: Duration,
}

impl LocalDaemon {
    /// Daemon arguments for the setup phase
    pub fn args(defaults_file: &Path, socket: &Path) -> Vec<String> {
        vec![
            format!("--defaults-file={}", defaults_file.display()),
            "--skip-networking".to_string(),
            format!("--socket={}", socket.display()),
        ]
    }

    /// Start the daemon binary with setup-phase arguments
    pub fn start(
        binary: &Path,
        defaults_file: &Path,
        socket: &Path,
        grace: Duration,
    ) -> SupervisorResult<Self> {
        Self::spawn(binary, &Self::args(defaults_file, socket), socket, grace)
    }

    /// Start an arbitrary program as the setup-phase daemon
    pub fn spawn(
        binary: &Path,
        args: &[String],
        socket: &Path,
        grace: Duration,
    ) -> SupervisorResult<Self> {
        let name = binary.display().to_string();
        let spawn_err = |e: std::io::Error| SupervisorError::Spawn {
            binary: name.clone(),
            reason: e.to_string(),
        };

        let child = Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout_stdio().map_err(spawn_err)?)
            .stderr(stdout_stdio().map_err(spawn_err)?)
            .spawn()
            .map_err(spawn_err)?;

        let pid = child.id().to_string();
        let socket_text = socket.display().to_string();
        log_event_with_fields(
            Event::LocalDaemonStart,
            &[("pid", &pid), ("socket", &socket_text)],
        );

        Ok(Self {
            child: Some(child),
            socket: socket.to_path_buf(),
            grace,
        })
    }

    /// Admin socket path
    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Process id, while running
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Poll `connect` until it succeeds, the process dies, the timeout
    /// passes or a signal arrives
    pub fn wait_ready_with<T>(
        &mut self,
        timeout: Duration,
        shutdown: &ShutdownSignal,
        mut connect: impl FnMut(&Path) -> AdminResult<T>,
    ) -> SupervisorResult<T> {
        let started = Instant::now();
        loop {
            if let Some(child) = self.child.as_mut() {
                if let Some(status) = child
                    .try_wait()
                    .map_err(|e| SupervisorError::io("poll local daemon", e))?
                {
                    self.child = None;
                    return Err(SupervisorError::ExitedEarly {
                        status: status.to_string(),
                    });
                }
            }

            let reason = match connect(&self.socket) {
                Ok(session) => {
                    let waited = format!("{}ms", started.elapsed().as_millis());
                    log_event_with_fields(Event::LocalDaemonReady, &[("waited", &waited)]);
                    return Ok(session);
                }
                Err(e) => e.to_string(),
            };

            if started.elapsed() >= timeout {
                return Err(SupervisorError::NotReady {
                    timeout_secs: timeout.as_secs(),
                    reason,
                });
            }
            if let Some(signal) = shutdown.sleep(READY_POLL) {
                return Err(SupervisorError::Interrupted { signal });
            }
        }
    }

    /// Shut down through `session`, falling back to SIGTERM, then to a
    /// kill once the grace period is over
    pub fn stop<S: AdminSession>(mut self, mut session: S) -> SupervisorResult<i32> {
        let requested = session.execute("SHUTDOWN").is_ok();
        drop(session);
        if !requested {
            self.terminate()?;
        }
        self.reap()
    }

    fn terminate(&self) -> SupervisorResult<()> {
        if let Some(child) = self.child.as_ref() {
            kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM)
                .map_err(|e| SupervisorError::io("signal local daemon", e))?;
        }
        Ok(())
    }

    fn reap(&mut self) -> SupervisorResult<i32> {
        let mut child = match self.child.take() {
            Some(child) => child,
            None => return Ok(0),
        };

        let deadline = Instant::now() + self.grace;
        let mut killed = false;
        let status = loop {
            if let Some(status) = child
                .try_wait()
                .map_err(|e| SupervisorError::io("wait for local daemon", e))?
            {
                break status;
            }
            if !killed && Instant::now() >= deadline {
                let pid = child.id().to_string();
                log_event_with_fields(Event::DaemonKilled, &[("pid", &pid), ("phase", "setup")]);
                child
                    .kill()
                    .map_err(|e| SupervisorError::io("kill local daemon", e))?;
                killed = true;
            }
            std::thread::sleep(Duration::from_millis(20));
        };

        let code = exit_code(status);
        let code_text = code.to_string();
        log_event_with_fields(Event::LocalDaemonStopped, &[("code", &code_text)]);
        Ok(code)
    }
}

impl Drop for LocalDaemon {
    fn drop(&mut self) {
        if self.child.is_some() {
            let _ = self.terminate();
            let _ = self.reap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::fake::FakeSession;
    use crate::admin::AdminError;
    use crate::supervisor::shutdown_channel;

    fn sh(script: &str, grace: Duration) -> LocalDaemon {
        LocalDaemon::spawn(
            Path::new("sh"),
            &["-c".to_string(), script.to_string()],
            Path::new("/tmp/test-admin.sock"),
            grace,
        )
        .unwrap()
    }

    fn refused(socket: &Path) -> AdminError {
        AdminError::Connect {
            target: socket.display().to_string(),
            reason: "refused".to_string(),
        }
    }

    #[test]
    fn test_args() {
        let args = LocalDaemon::args(Path::new("/tmp/x.cnf"), Path::new("/tmp/mysql.sock"));
        assert_eq!(
            args,
            vec![
                "--defaults-file=/tmp/x.cnf",
                "--skip-networking",
                "--socket=/tmp/mysql.sock"
            ]
        );
    }

    #[test]
    fn test_ready_after_a_few_attempts() {
        let (_trigger, signal) = shutdown_channel();
        let mut daemon = sh("sleep 30", Duration::from_millis(200));
        let mut calls = 0;
        let result = daemon.wait_ready_with(Duration::from_secs(10), &signal, |socket| {
            calls += 1;
            if calls < 3 {
                Err(refused(socket))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_exit_before_ready() {
        let (_trigger, signal) = shutdown_channel();
        let mut daemon = sh("exit 3", Duration::from_millis(200));
        std::thread::sleep(Duration::from_millis(200));
        let err = daemon
            .wait_ready_with(Duration::from_secs(5), &signal, |s| Err::<(), _>(refused(s)))
            .unwrap_err();
        assert!(matches!(err, SupervisorError::ExitedEarly { .. }));
    }

    #[test]
    fn test_not_ready_in_time() {
        let (_trigger, signal) = shutdown_channel();
        let mut daemon = sh("sleep 30", Duration::from_millis(200));
        let err = daemon
            .wait_ready_with(Duration::from_millis(300), &signal, |s| Err::<(), _>(refused(s)))
            .unwrap_err();
        assert!(matches!(err, SupervisorError::NotReady { .. }));
    }

    #[test]
    fn test_interrupted_while_waiting() {
        let (trigger, signal) = shutdown_channel();
        trigger.trigger(15);
        let mut daemon = sh("sleep 30", Duration::from_millis(200));
        let err = daemon
            .wait_ready_with(Duration::from_secs(10), &signal, |s| Err::<(), _>(refused(s)))
            .unwrap_err();
        assert_eq!(err, SupervisorError::Interrupted { signal: 15 });
    }

    #[test]
    fn test_stop_falls_back_to_sigterm() {
        let daemon = sh("sleep 30", Duration::from_secs(5));
        let start = Instant::now();
        let code = daemon.stop(FakeSession::new().failing_on("SHUTDOWN")).unwrap();
        assert_eq!(code, 128 + 15);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_stop_kills_after_grace() {
        let daemon = sh("trap '' TERM; sleep 30", Duration::from_millis(200));
        let code = daemon.stop(FakeSession::new()).unwrap();
        assert_eq!(code, 128 + 9);
    }

    #[test]
    fn test_drop_terminates_before_killing() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("terminated");
        let script = format!(
            "trap 'touch {}; exit 0' TERM; while :; do sleep 0.1; done",
            marker.display()
        );
        drop(sh(&script, Duration::from_secs(5)));
        assert!(marker.exists());
    }

    #[test]
    fn test_drop_kills_once_grace_runs_out() {
        let daemon = sh("trap '' TERM; exec sleep 30", Duration::from_millis(200));
        let start = Instant::now();
        drop(daemon);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
