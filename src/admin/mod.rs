//! Local admin connection
//!
//! A blocking session to the setup-phase daemon over its unix socket.
//! Credential enforcement and replication bootstrap only see the
//! [`AdminSession`] trait.

mod errors;
mod session;
mod sql;

#[cfg(test)]
pub(crate) mod fake;

pub use errors::{AdminError, AdminResult};
pub use session::{AdminSession, MysqlAdminSession, ReplicaStatus};
pub use sql::{account, quote_identifier, quote_literal, redact};
