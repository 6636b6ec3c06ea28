//! Validation errors
//!
//! One variant per rule. All of them are fatal and are raised before any
//! file is written or any process is started.

use thiserror::Error;

/// Rejected environment or configuration input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Only one half of the user/password pair was given
    #[error("{present} is set but {missing} is not; MYSQL_USER and MYSQL_PASSWORD must be given together")]
    UnpairedCredentials {
        /// Variable that was set
        present: &'static str,
        /// Variable that was missing
        missing: &'static str,
    },

    /// Account requested without a database
    #[error("MYSQL_DATABASE is required when MYSQL_USER and MYSQL_PASSWORD are set")]
    MissingDatabase,

    /// Database requested without an account
    #[error("MYSQL_DATABASE requires MYSQL_USER and MYSQL_PASSWORD")]
    DatabaseWithoutAccount,

    /// `root` used where an application or replication user is expected
    #[error("{variable} must not be 'root'; use MYSQL_ROOT_PASSWORD to configure the root account")]
    ReservedUsername {
        /// Offending variable
        variable: &'static str,
    },

    /// Identifier outside `[A-Za-z0-9_]+`
    #[error("{variable} must contain only letters, digits and underscores")]
    InvalidIdentifier {
        /// Offending variable
        variable: &'static str,
    },

    /// Identifier over the length ceiling
    #[error("{variable} is longer than {max} characters")]
    IdentifierTooLong {
        /// Offending variable
        variable: &'static str,
        /// Ceiling for this identifier
        max: usize,
    },

    /// Empty password or one containing a quote or backslash
    #[error("{variable} must be non-empty and must not contain ' or \\")]
    InvalidPassword {
        /// Offending variable
        variable: &'static str,
    },

    /// Replication role started without its required inputs
    #[error("the {role} role requires {variable}")]
    MissingReplicationSetting {
        /// Role being started
        role: &'static str,
        /// Missing variable
        variable: &'static str,
    },

    /// Replication and application accounts share a name
    #[error("MYSQL_MASTER_USER must differ from MYSQL_USER: both are '{user}'")]
    SharedReplicationAccount {
        /// Shared user name
        user: String,
    },

    /// Master address is not a host name or address
    #[error("MYSQL_MASTER_SERVICE_NAME is not a valid host name: '{value}'")]
    InvalidMasterAddress {
        /// Rejected value
        value: String,
    },

    /// Tunable with a value outside its type
    #[error("{variable}='{value}' is invalid: expected {expected}")]
    InvalidSetting {
        /// Offending variable
        variable: &'static str,
        /// Rejected value
        value: String,
        /// Human-readable expectation
        expected: String,
    },

    /// User configuration fragment could not be read
    #[error("cannot read configuration fragment {path}: {reason}")]
    UnreadableFragment {
        /// Fragment path
        path: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// User configuration fragment is not a valid option file
    #[error("configuration fragment {path}, line {line}: {reason}")]
    MalformedFragment {
        /// Fragment path
        path: String,
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },
}

impl ValidationError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnpairedCredentials { .. } => "MYSQLD_VALIDATION_UNPAIRED_CREDENTIALS",
            Self::MissingDatabase => "MYSQLD_VALIDATION_MISSING_DATABASE",
            Self::DatabaseWithoutAccount => "MYSQLD_VALIDATION_DATABASE_WITHOUT_ACCOUNT",
            Self::ReservedUsername { .. } => "MYSQLD_VALIDATION_RESERVED_USERNAME",
            Self::InvalidIdentifier { .. } => "MYSQLD_VALIDATION_INVALID_IDENTIFIER",
            Self::IdentifierTooLong { .. } => "MYSQLD_VALIDATION_IDENTIFIER_TOO_LONG",
            Self::InvalidPassword { .. } => "MYSQLD_VALIDATION_INVALID_PASSWORD",
            Self::MissingReplicationSetting { .. } => "MYSQLD_VALIDATION_MISSING_REPLICATION_SETTING",
            Self::SharedReplicationAccount { .. } => "MYSQLD_VALIDATION_SHARED_REPLICATION_ACCOUNT",
            Self::InvalidMasterAddress { .. } => "MYSQLD_VALIDATION_INVALID_MASTER_ADDRESS",
            Self::InvalidSetting { .. } => "MYSQLD_VALIDATION_INVALID_SETTING",
            Self::UnreadableFragment { .. } => "MYSQLD_VALIDATION_UNREADABLE_FRAGMENT",
            Self::MalformedFragment { .. } => "MYSQLD_VALIDATION_MALFORMED_FRAGMENT",
        }
    }
}

/// Result type for validation
pub type ValidationResult<T> = Result<T, ValidationError>;
