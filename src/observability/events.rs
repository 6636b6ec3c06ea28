//! Observable orchestration events
//!
//! Events are explicit and typed; the logger only ever sees their
//! stable names.

use std::fmt;

use super::logger::Severity;

/// Observable events during a container start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Orchestration begins
    OrchestrationStart,
    /// Orchestration failed before the daemon took over
    OrchestrationAborted,

    // Inputs
    /// Data directory classified
    InitStateDetected,
    /// Container memory limit read from cgroups
    MemoryLimitDetected,
    /// A limit file exists but carries no finite limit
    MemoryLimitUnbounded,
    /// Settings, credentials and replication link resolved
    ConfigResolved,
    /// Configuration document written for the daemon
    ConfigWritten,

    // Data directory
    /// First-time system table creation begins
    DatadirBootstrapStart,
    /// First-time system table creation complete
    DatadirBootstrapComplete,

    // Setup-phase daemon
    /// Socket-only daemon spawned
    LocalDaemonStart,
    /// Socket-only daemon accepts admin sessions
    LocalDaemonReady,
    /// Socket-only daemon shut down
    LocalDaemonStopped,

    // Accounts
    /// Account created
    AccountCreated,
    /// Existing account password reset to the declared value
    AccountPasswordReset,
    /// Remote root account configured
    RootRemoteEnabled,
    /// Remote root account removed
    RootRemoteDisabled,
    /// All declared credentials reconciled
    CredentialsEnforced,

    // Hooks
    /// User hook script ran
    HookExecuted,

    // Replication
    /// Replication bootstrap state changed
    ReplicationState,
    /// Replication attempt failed and will be retried
    ReplicationRetry,

    // Supervision
    /// Long-lived daemon spawned
    DaemonStart,
    /// Termination signal forwarded to the daemon
    SignalForwarded,
    /// Daemon ignored the grace period and was killed
    DaemonKilled,
    /// Daemon exited
    DaemonExited,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::OrchestrationStart => "ORCHESTRATION_START",
            Event::OrchestrationAborted => "ORCHESTRATION_ABORTED",
            Event::InitStateDetected => "INIT_STATE_DETECTED",
            Event::MemoryLimitDetected => "MEMORY_LIMIT_DETECTED",
            Event::MemoryLimitUnbounded => "MEMORY_LIMIT_UNBOUNDED",
            Event::ConfigResolved => "CONFIG_RESOLVED",
            Event::ConfigWritten => "CONFIG_WRITTEN",
            Event::DatadirBootstrapStart => "DATADIR_BOOTSTRAP_START",
            Event::DatadirBootstrapComplete => "DATADIR_BOOTSTRAP_COMPLETE",
            Event::LocalDaemonStart => "LOCAL_DAEMON_START",
            Event::LocalDaemonReady => "LOCAL_DAEMON_READY",
            Event::LocalDaemonStopped => "LOCAL_DAEMON_STOPPED",
            Event::AccountCreated => "ACCOUNT_CREATED",
            Event::AccountPasswordReset => "ACCOUNT_PASSWORD_RESET",
            Event::RootRemoteEnabled => "ROOT_REMOTE_ENABLED",
            Event::RootRemoteDisabled => "ROOT_REMOTE_DISABLED",
            Event::CredentialsEnforced => "CREDENTIALS_ENFORCED",
            Event::HookExecuted => "HOOK_EXECUTED",
            Event::ReplicationState => "REPLICATION_STATE",
            Event::ReplicationRetry => "REPLICATION_RETRY",
            Event::DaemonStart => "DAEMON_START",
            Event::SignalForwarded => "SIGNAL_FORWARDED",
            Event::DaemonKilled => "DAEMON_KILLED",
            Event::DaemonExited => "DAEMON_EXITED",
        }
    }

    /// Severity of the log line
    pub fn severity(&self) -> Severity {
        match self {
            Event::OrchestrationAborted => Severity::Fatal,
            Event::DaemonKilled => Severity::Error,
            Event::ReplicationRetry | Event::SignalForwarded => Severity::Warn,
            Event::MemoryLimitUnbounded => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
