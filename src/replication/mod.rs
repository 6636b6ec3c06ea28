//! Replication Subsystem
//!
//! A container may start as a master or as a slave of a master.
//!
//! - The role is chosen by the start command, never inferred
//! - A master only prepares the replication account
//! - A slave points itself at the master and waits, with bounded retries,
//!   until both replication threads run
//! - Exhausted retries abort the start
//!
//! The server id of either role derives from the host address so that
//! restarts of the same container keep the same id.

mod bootstrap;
mod errors;
mod identity;
mod link;
mod retry;
mod role;

pub use bootstrap::ReplicationBootstrapper;
pub use errors::{ReplicationError, ReplicationErrorKind, ReplicationResult};
pub use identity::HostIdentity;
pub use link::{BinlogFormat, ReplicationLink};
pub use retry::RetryPolicy;
pub use role::{BootstrapState, ReplicationRole};
