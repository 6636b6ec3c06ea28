//! Daemon processes and termination signals
//!
//! Two lifetimes: the setup-phase [`LocalDaemon`], blocking and short,
//! and the [`DaemonSupervisor`] that owns the long-lived daemon and the
//! container's exit code. Both route child output to our stdout.

mod daemon;
mod errors;
mod local;
mod output;
mod shutdown;

pub use daemon::{DaemonSupervisor, DEFAULT_GRACE, SCRUBBED_ENV};
pub use errors::{SupervisorError, SupervisorResult};
pub use local::LocalDaemon;
pub use output::{exit_code, stdout_stdio};
pub use shutdown::{shutdown_channel, spawn_signal_listener, ShutdownSignal, ShutdownTrigger};
