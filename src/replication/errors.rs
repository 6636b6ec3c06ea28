//! Replication error types
//!
//! Slave-side connectivity and authentication failures are retried
//! locally; what reaches the orchestrator is always fatal.

use std::fmt;

use crate::admin::AdminError;

/// Replication error type
#[derive(Debug, Clone)]
pub struct ReplicationError {
    /// Error kind
    pub kind: ReplicationErrorKind,
    /// Error message
    pub message: String,
    signal: Option<i32>,
}

/// Replication error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationErrorKind {
    /// Illegal state transition attempted
    IllegalTransition,
    /// Admin statement against the local daemon failed
    AdminFailure,
    /// Slave threads never reached streaming within the retry budget
    RetriesExhausted,
    /// A termination signal arrived while waiting
    Interrupted,
    /// Link is missing inputs its role needs
    ConfigurationError,
}

impl ReplicationError {
    /// Create a new replication error.
    pub fn new(kind: ReplicationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            signal: None,
        }
    }

    /// Create an illegal transition error.
    pub fn illegal_transition(message: impl Into<String>) -> Self {
        Self::new(ReplicationErrorKind::IllegalTransition, message)
    }

    /// Create a retries exhausted error.
    pub fn retries_exhausted(attempts: u32, last_reason: &str) -> Self {
        Self::new(
            ReplicationErrorKind::RetriesExhausted,
            format!(
                "slave did not reach streaming after {} attempts; last error: {}",
                attempts, last_reason
            ),
        )
    }

    /// Create an interrupted error.
    pub fn interrupted(signal: i32) -> Self {
        let mut err = Self::new(
            ReplicationErrorKind::Interrupted,
            format!("interrupted by signal {}", signal),
        );
        err.signal = Some(signal);
        err
    }

    /// Signal that interrupted the bootstrap, if that is what happened
    pub fn signal(&self) -> Option<i32> {
        self.signal
    }

    /// Create a configuration error.
    pub fn configuration_error(message: impl Into<String>) -> Self {
        Self::new(ReplicationErrorKind::ConfigurationError, message)
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self.kind {
            ReplicationErrorKind::IllegalTransition => "MYSQLD_REPLICATION_ILLEGAL_TRANSITION",
            ReplicationErrorKind::AdminFailure => "MYSQLD_REPLICATION_ADMIN_FAILURE",
            ReplicationErrorKind::RetriesExhausted => "MYSQLD_REPLICATION_RETRIES_EXHAUSTED",
            ReplicationErrorKind::Interrupted => "MYSQLD_REPLICATION_INTERRUPTED",
            ReplicationErrorKind::ConfigurationError => "MYSQLD_REPLICATION_CONFIGURATION_ERROR",
        }
    }
}

impl fmt::Display for ReplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReplicationError({:?}): {}", self.kind, self.message)
    }
}

impl std::error::Error for ReplicationError {}

impl From<AdminError> for ReplicationError {
    fn from(e: AdminError) -> Self {
        Self::new(ReplicationErrorKind::AdminFailure, e.to_string())
    }
}

/// Result type for replication operations
pub type ReplicationResult<T> = Result<T, ReplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_message() {
        let err = ReplicationError::retries_exhausted(30, "Access denied");
        assert_eq!(err.kind, ReplicationErrorKind::RetriesExhausted);
        assert!(err.message.contains("30 attempts"));
        assert!(err.message.contains("Access denied"));
    }

    #[test]
    fn test_admin_error_converts() {
        let err: ReplicationError = AdminError::Statement {
            statement: "START SLAVE".to_string(),
            reason: "boom".to_string(),
        }
        .into();
        assert_eq!(err.code(), "MYSQLD_REPLICATION_ADMIN_FAILURE");
    }
}
