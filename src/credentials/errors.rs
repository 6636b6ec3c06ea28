//! Credential enforcement errors
//!
//! Every variant is fatal: the long-lived daemon is never started with
//! accounts that do not match the declared environment.

use thiserror::Error;

use crate::admin::AdminError;

/// Credential reconciliation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The admin connection could not be opened
    #[error("admin connection unavailable: {0}")]
    Unreachable(AdminError),

    /// A reconciliation step was rejected by the daemon
    #[error("failed to {step}: {source}")]
    Reconcile {
        /// What was being done
        step: &'static str,
        /// Underlying admin error
        #[source]
        source: AdminError,
    },
}

impl CredentialError {
    /// Wrap an admin error raised during `step`
    pub fn reconcile(step: &'static str, source: AdminError) -> Self {
        CredentialError::Reconcile { step, source }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CredentialError::Unreachable(_) => "MYSQLD_CREDENTIAL_UNREACHABLE",
            CredentialError::Reconcile { .. } => "MYSQLD_CREDENTIAL_RECONCILE",
        }
    }
}

/// Result type for credential operations
pub type CredentialResult<T> = Result<T, CredentialError>;
