//! Child output routing

use std::io;
use std::os::fd::AsFd;
use std::process::Stdio;

/// A fresh handle on our stdout, for a child's stdout or stderr
pub fn stdout_stdio() -> io::Result<Stdio> {
    let fd = io::stdout().as_fd().try_clone_to_owned()?;
    Ok(Stdio::from(fd))
}

/// Exit code for a finished process: its own code, or 128 + signal
pub fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_exit_code_passthrough() {
        let status = Command::new("sh").args(["-c", "exit 7"]).status().unwrap();
        assert_eq!(exit_code(status), 7);
    }

    #[test]
    fn test_exit_code_for_signal() {
        let status = Command::new("sh")
            .args(["-c", "kill -9 $$"])
            .status()
            .unwrap();
        assert_eq!(exit_code(status), 137);
    }

    #[test]
    fn test_stdout_stdio_usable() {
        let status = Command::new("true")
            .stdout(stdout_stdio().unwrap())
            .status()
            .unwrap();
        assert!(status.success());
    }
}
