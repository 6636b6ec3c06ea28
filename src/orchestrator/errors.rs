//! Orchestration failure taxonomy
//!
//! Each category maps to its own process exit code so the container
//! runtime can tell a bad environment from a failed bootstrap.
//!
//! | category       | exit code    |
//! |----------------|--------------|
//! | Validation     | 2            |
//! | Initialization | 3            |
//! | Credential     | 4            |
//! | Replication    | 5            |
//! | Supervisor     | 6            |
//! | Interrupted    | 128 + signal |

use thiserror::Error;

use crate::config::ValidationError;
use crate::credentials::CredentialError;
use crate::datadir::DataDirError;
use crate::hooks::HookError;
use crate::replication::ReplicationError;
use crate::supervisor::SupervisorError;

/// Data directory or init hook failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitializationError {
    /// Detection or engine bootstrap failed
    #[error(transparent)]
    DataDir(#[from] DataDirError),

    /// An init hook failed
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The rendered configuration could not be written
    #[error("cannot write configuration to {path}: {reason}")]
    ConfigWrite {
        /// Target path
        path: String,
        /// OS error
        reason: String,
    },
}

impl InitializationError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            InitializationError::DataDir(e) => e.code().code(),
            InitializationError::Hook(e) => e.code(),
            InitializationError::ConfigWrite { .. } => "MYSQLD_INIT_CONFIG_WRITE",
        }
    }
}

/// Any fatal orchestration failure
#[derive(Debug, Clone, Error)]
pub enum OrchestratorError {
    /// Rejected environment or configuration
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Data directory, configuration file or hook failure
    #[error("initialization failed: {0}")]
    Initialization(#[from] InitializationError),

    /// Accounts could not be reconciled
    #[error("credential enforcement failed: {0}")]
    Credential(#[from] CredentialError),

    /// Replication bootstrap failed
    #[error("replication bootstrap failed: {0}")]
    Replication(ReplicationError),

    /// Process management failure
    #[error("supervisor failed: {0}")]
    Supervisor(SupervisorError),

    /// A termination signal arrived before the daemon took over
    #[error("interrupted by signal {signal} before the daemon started")]
    Interrupted {
        /// Signal number
        signal: i32,
    },
}

impl OrchestratorError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            OrchestratorError::Validation(_) => 2,
            OrchestratorError::Initialization(_) => 3,
            OrchestratorError::Credential(_) => 4,
            OrchestratorError::Replication(_) => 5,
            OrchestratorError::Supervisor(_) => 6,
            OrchestratorError::Interrupted { signal } => 128 + signal,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            OrchestratorError::Validation(e) => e.code(),
            OrchestratorError::Initialization(e) => e.code(),
            OrchestratorError::Credential(e) => e.code(),
            OrchestratorError::Replication(e) => e.code(),
            OrchestratorError::Supervisor(e) => e.code(),
            OrchestratorError::Interrupted { .. } => "MYSQLD_INTERRUPTED",
        }
    }
}

impl From<DataDirError> for OrchestratorError {
    fn from(e: DataDirError) -> Self {
        OrchestratorError::Initialization(e.into())
    }
}

impl From<HookError> for OrchestratorError {
    fn from(e: HookError) -> Self {
        OrchestratorError::Initialization(e.into())
    }
}

impl From<ReplicationError> for OrchestratorError {
    fn from(e: ReplicationError) -> Self {
        match e.signal() {
            Some(signal) => OrchestratorError::Interrupted { signal },
            None => OrchestratorError::Replication(e),
        }
    }
}

impl From<SupervisorError> for OrchestratorError {
    fn from(e: SupervisorError) -> Self {
        match e {
            SupervisorError::Interrupted { signal } => OrchestratorError::Interrupted { signal },
            other => OrchestratorError::Supervisor(other),
        }
    }
}

/// Result type for orchestration
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
