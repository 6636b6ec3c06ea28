//! Admin connection errors

use thiserror::Error;

/// Failure talking to the local daemon
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    /// Could not open a session on the admin socket
    #[error("cannot connect to the local daemon at {target}: {reason}")]
    Connect {
        /// Socket path
        target: String,
        /// Driver message
        reason: String,
    },

    /// A statement was rejected
    #[error("statement failed: {statement}: {reason}")]
    Statement {
        /// Statement with literals redacted
        statement: String,
        /// Driver message
        reason: String,
    },

    /// A status row was missing a column or held an unexpected value
    #[error("unexpected response to {query}: {reason}")]
    UnexpectedResponse {
        /// Query that produced it
        query: String,
        /// What was wrong
        reason: String,
    },
}

impl AdminError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            AdminError::Connect { .. } => "MYSQLD_ADMIN_CONNECT",
            AdminError::Statement { .. } => "MYSQLD_ADMIN_STATEMENT",
            AdminError::UnexpectedResponse { .. } => "MYSQLD_ADMIN_UNEXPECTED_RESPONSE",
        }
    }
}

/// Result type for admin operations
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = AdminError::Connect {
            target: "/tmp/mysql.sock".to_string(),
            reason: "refused".to_string(),
        };
        assert_eq!(err.code(), "MYSQLD_ADMIN_CONNECT");
        assert!(err.to_string().contains("/tmp/mysql.sock"));
    }
}
