//! Supervisor errors

use thiserror::Error;

/// Failure starting, waiting for or stopping a daemon process
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    /// The process could not be started
    #[error("cannot start {binary}: {reason}")]
    Spawn {
        /// Program path
        binary: String,
        /// OS error
        reason: String,
    },

    /// Waiting on or signalling the process failed
    #[error("{context}: {reason}")]
    Io {
        /// What was being done
        context: &'static str,
        /// OS error
        reason: String,
    },

    /// The setup-phase daemon exited before accepting connections
    #[error("local daemon exited before it was ready ({status})")]
    ExitedEarly {
        /// Exit status
        status: String,
    },

    /// The setup-phase daemon did not accept connections in time
    #[error("local daemon not ready after {timeout_secs}s: {reason}")]
    NotReady {
        /// Readiness timeout
        timeout_secs: u64,
        /// Last connection error
        reason: String,
    },

    /// A termination signal arrived while waiting
    #[error("interrupted by signal {signal}")]
    Interrupted {
        /// Signal number
        signal: i32,
    },
}

impl SupervisorError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SupervisorError::Spawn { .. } => "MYSQLD_SUPERVISOR_SPAWN",
            SupervisorError::Io { .. } => "MYSQLD_SUPERVISOR_IO",
            SupervisorError::ExitedEarly { .. } => "MYSQLD_SUPERVISOR_EXITED_EARLY",
            SupervisorError::NotReady { .. } => "MYSQLD_SUPERVISOR_NOT_READY",
            SupervisorError::Interrupted { .. } => "MYSQLD_SUPERVISOR_INTERRUPTED",
        }
    }

    pub(crate) fn io(context: &'static str, err: impl std::fmt::Display) -> Self {
        SupervisorError::Io {
            context,
            reason: err.to_string(),
        }
    }
}

/// Result type for supervisor operations
pub type SupervisorResult<T> = Result<T, SupervisorError>;
