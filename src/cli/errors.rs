//! CLI-specific error types
//!
//! Every CLI error is fatal: it is logged and becomes the exit code.

use std::io;

use thiserror::Error;

use crate::orchestrator::OrchestratorError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    /// The orchestration itself failed
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    /// The async runtime or signal listener could not be set up
    #[error("cannot start runtime: {0}")]
    Runtime(String),

    /// The client binary could not be executed
    #[error("cannot exec client {binary}: {reason}")]
    ClientExec {
        /// Client binary
        binary: String,
        /// OS error
        reason: String,
    },

    /// stdout write or JSON encoding failed
    #[error("output error: {0}")]
    Output(String),
}

impl CliError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Orchestrator(e) => e.code(),
            CliError::Runtime(_) => "MYSQLD_CLI_RUNTIME",
            CliError::ClientExec { .. } => "MYSQLD_CLI_CLIENT_EXEC",
            CliError::Output(_) => "MYSQLD_CLI_OUTPUT",
        }
    }

    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Orchestrator(e) => e.exit_code(),
            CliError::ClientExec { .. } => 127,
            CliError::Runtime(_) | CliError::Output(_) => 1,
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Output(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
