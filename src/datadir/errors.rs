//! Data directory error types
//!
//! Error codes:
//! - MYSQLD_DATADIR_NOT_A_DIRECTORY
//! - MYSQLD_DATADIR_UNREADABLE
//! - MYSQLD_DATADIR_BOOTSTRAP_SPAWN
//! - MYSQLD_DATADIR_BOOTSTRAP_FAILED
//!
//! All of them are initialization failures and abort the start.

use std::fmt;

/// Data directory error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirErrorCode {
    /// The data directory path exists but is not a directory
    NotADirectory,
    /// The data directory could not be listed or created
    Unreadable,
    /// The bootstrap process could not be started
    BootstrapSpawn,
    /// The bootstrap process exited unsuccessfully
    BootstrapFailed,
}

impl DataDirErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            DataDirErrorCode::NotADirectory => "MYSQLD_DATADIR_NOT_A_DIRECTORY",
            DataDirErrorCode::Unreadable => "MYSQLD_DATADIR_UNREADABLE",
            DataDirErrorCode::BootstrapSpawn => "MYSQLD_DATADIR_BOOTSTRAP_SPAWN",
            DataDirErrorCode::BootstrapFailed => "MYSQLD_DATADIR_BOOTSTRAP_FAILED",
        }
    }
}

impl fmt::Display for DataDirErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Data directory error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDirError {
    code: DataDirErrorCode,
    message: String,
}

impl DataDirError {
    /// Create a new error
    pub fn new(code: DataDirErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Path exists but is not a directory
    pub fn not_a_directory(path: impl fmt::Display) -> Self {
        Self::new(
            DataDirErrorCode::NotADirectory,
            format!("{} exists but is not a directory", path),
        )
    }

    /// Directory cannot be read or created
    pub fn unreadable(path: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::new(
            DataDirErrorCode::Unreadable,
            format!("cannot access {}: {}", path, reason),
        )
    }

    /// Bootstrap process failed to start
    pub fn bootstrap_spawn(binary: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::new(
            DataDirErrorCode::BootstrapSpawn,
            format!("cannot run {}: {}", binary, reason),
        )
    }

    /// Bootstrap process exited unsuccessfully
    pub fn bootstrap_failed(status: impl fmt::Display) -> Self {
        Self::new(
            DataDirErrorCode::BootstrapFailed,
            format!("data directory initialization exited with {}", status),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> DataDirErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DataDirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl std::error::Error for DataDirError {}

/// Result type for data directory operations
pub type DataDirResult<T> = Result<T, DataDirError>;
