//! Replication role and bootstrap state machine
//!
//! States:
//! - Unconfigured: nothing done yet
//! - Configured: binlog settings applied, master/slave preparation done
//! - Connecting: slave threads started, not yet both running
//! - Streaming: slave I/O and SQL threads both running
//! - Failed: slave thread reported an error; may go back to Connecting
//!
//! Configured is terminal for a master. Only a slave walks on to
//! Connecting and Streaming.

use super::errors::{ReplicationError, ReplicationResult};

/// Replication role, chosen by the start command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplicationRole {
    /// Standalone server
    #[default]
    None,
    /// Binlog source; slaves register with it
    Master,
    /// Binlog consumer of a master
    Slave,
}

impl ReplicationRole {
    /// Name for logs and errors
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicationRole::None => "none",
            ReplicationRole::Master => "master",
            ReplicationRole::Slave => "slave",
        }
    }

    /// Whether this role needs binlog and replication setup
    pub fn is_replicating(&self) -> bool {
        !matches!(self, ReplicationRole::None)
    }
}

/// Bootstrap progress for one start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapState {
    /// Nothing applied yet
    Unconfigured,
    /// Role preparation done
    Configured {
        /// Role that was configured
        role: ReplicationRole,
    },
    /// Slave threads started, waiting for both to run
    Connecting {
        /// 1-based attempt counter
        attempt: u32,
    },
    /// Slave I/O and SQL threads running
    Streaming,
    /// Slave thread error observed
    Failed {
        /// Attempt that failed
        attempt: u32,
        /// Error reported by the engine
        reason: String,
    },
}

impl BootstrapState {
    /// Initial state
    pub fn new() -> Self {
        Self::Unconfigured
    }

    /// Unconfigured → Configured
    pub fn configure(self, role: ReplicationRole) -> ReplicationResult<Self> {
        match (self, role) {
            (_, ReplicationRole::None) => Err(ReplicationError::illegal_transition(
                "no replication role to configure",
            )),
            (Self::Unconfigured, role) => Ok(Self::Configured { role }),
            (Self::Configured { role: existing }, role) if existing == role => {
                Ok(Self::Configured { role })
            }
            (state, _) => Err(ReplicationError::illegal_transition(format!(
                "cannot configure from {}",
                state.state_name()
            ))),
        }
    }

    /// Configured(slave) → Connecting, or Failed → Connecting on retry
    pub fn connect(self) -> ReplicationResult<Self> {
        match self {
            Self::Configured {
                role: ReplicationRole::Slave,
            } => Ok(Self::Connecting { attempt: 1 }),
            Self::Configured { role } => Err(ReplicationError::illegal_transition(format!(
                "{} side has no outbound connection",
                role.as_str()
            ))),
            Self::Failed { attempt, .. } => Ok(Self::Connecting {
                attempt: attempt + 1,
            }),
            Self::Connecting { attempt } => Ok(Self::Connecting { attempt }),
            state => Err(ReplicationError::illegal_transition(format!(
                "cannot connect from {}",
                state.state_name()
            ))),
        }
    }

    /// Connecting → Connecting, counting one more observation
    pub fn keep_waiting(self) -> ReplicationResult<Self> {
        match self {
            Self::Connecting { attempt } => Ok(Self::Connecting {
                attempt: attempt + 1,
            }),
            state => Err(ReplicationError::illegal_transition(format!(
                "cannot wait from {}",
                state.state_name()
            ))),
        }
    }

    /// Connecting → Streaming
    pub fn stream(self) -> ReplicationResult<Self> {
        match self {
            Self::Connecting { .. } | Self::Streaming => Ok(Self::Streaming),
            state => Err(ReplicationError::illegal_transition(format!(
                "cannot stream from {}",
                state.state_name()
            ))),
        }
    }

    /// Connecting → Failed
    pub fn fail(self, reason: impl Into<String>) -> ReplicationResult<Self> {
        match self {
            Self::Connecting { attempt } => Ok(Self::Failed {
                attempt,
                reason: reason.into(),
            }),
            state => Err(ReplicationError::illegal_transition(format!(
                "cannot fail from {}",
                state.state_name()
            ))),
        }
    }

    /// Current attempt number, if connecting or failed
    pub fn attempt(&self) -> Option<u32> {
        match self {
            Self::Connecting { attempt } | Self::Failed { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }

    /// Whether bootstrap is finished for the role
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            Self::Configured {
                role: ReplicationRole::Master
            } | Self::Streaming
        )
    }

    /// State name for logs
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Configured { .. } => "configured",
            Self::Connecting { .. } => "connecting",
            Self::Streaming => "streaming",
            Self::Failed { .. } => "failed",
        }
    }
}

impl Default for BootstrapState {
    fn default() -> Self {
        Self::new()
    }
}
