//! Admin sessions against the local daemon

use std::path::Path;

use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Row};

use super::errors::{AdminError, AdminResult};
use super::sql::redact;

/// Columns of `SHOW SLAVE STATUS` the bootstrapper acts on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicaStatus {
    /// `Slave_IO_Running`: Yes, No or Connecting
    pub io_running: String,
    /// `Slave_SQL_Running`: Yes or No
    pub sql_running: String,
    /// `Last_IO_Errno`
    pub last_io_errno: u32,
    /// `Last_IO_Error`
    pub last_io_error: String,
    /// `Last_SQL_Error`
    pub last_sql_error: String,
}

impl ReplicaStatus {
    /// Both replication threads are running
    pub fn is_streaming(&self) -> bool {
        self.io_running.eq_ignore_ascii_case("yes") && self.sql_running.eq_ignore_ascii_case("yes")
    }

    /// Reported I/O or SQL thread error, if any
    pub fn error(&self) -> Option<String> {
        if self.last_io_errno != 0 || !self.last_io_error.is_empty() {
            return Some(format!(
                "I/O thread error {}: {}",
                self.last_io_errno, self.last_io_error
            ));
        }
        if !self.last_sql_error.is_empty() {
            return Some(format!("SQL thread error: {}", self.last_sql_error));
        }
        None
    }
}

/// A blocking, short-lived admin session
///
/// Everything credential enforcement and replication bootstrap need from
/// the daemon goes through this trait.
pub trait AdminSession {
    /// Run a statement that returns no rows
    fn execute(&mut self, statement: &str) -> AdminResult<()>;

    /// Whether `'user'@'host'` exists
    fn account_exists(&mut self, user: &str, host: &str) -> AdminResult<bool>;

    /// Current replica status; `None` when replication is not configured
    fn replica_status(&mut self) -> AdminResult<Option<ReplicaStatus>>;
}

/// Admin session over the daemon's unix socket as passwordless local root
pub struct MysqlAdminSession {
    conn: Conn,
}

impl MysqlAdminSession {
    /// Connect and verify the session answers queries
    pub fn connect(socket: &Path) -> AdminResult<Self> {
        let target = socket.display().to_string();
        let opts = OptsBuilder::new()
            .socket(Some(target.clone()))
            .user(Some("root"))
            .prefer_socket(true);

        let mut conn = Conn::new(opts).map_err(|e| AdminError::Connect {
            target: target.clone(),
            reason: e.to_string(),
        })?;
        conn.query_drop("SELECT 1").map_err(|e| AdminError::Connect {
            target,
            reason: e.to_string(),
        })?;

        Ok(Self { conn })
    }
}

impl AdminSession for MysqlAdminSession {
    fn execute(&mut self, statement: &str) -> AdminResult<()> {
        self.conn
            .query_drop(statement)
            .map_err(|e| AdminError::Statement {
                statement: redact(statement),
                reason: e.to_string(),
            })
    }

    fn account_exists(&mut self, user: &str, host: &str) -> AdminResult<bool> {
        const QUERY: &str = "SELECT COUNT(*) FROM mysql.user WHERE User = ? AND Host = ?";
        let count: Option<u64> = self
            .conn
            .exec_first(QUERY, (user, host))
            .map_err(|e| AdminError::Statement {
                statement: QUERY.to_string(),
                reason: e.to_string(),
            })?;
        Ok(count.unwrap_or(0) > 0)
    }

    fn replica_status(&mut self) -> AdminResult<Option<ReplicaStatus>> {
        const QUERY: &str = "SHOW SLAVE STATUS";
        let row: Option<Row> = self
            .conn
            .query_first(QUERY)
            .map_err(|e| AdminError::Statement {
                statement: QUERY.to_string(),
                reason: e.to_string(),
            })?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let text = |column: &str| -> String {
            row.get_opt::<Option<String>, _>(column)
                .and_then(Result::ok)
                .flatten()
                .unwrap_or_default()
        };

        let errno_text = text("Last_IO_Errno");
        let last_io_errno = if errno_text.is_empty() {
            0
        } else {
            errno_text
                .parse()
                .map_err(|_| AdminError::UnexpectedResponse {
                    query: QUERY.to_string(),
                    reason: format!("Last_IO_Errno is not a number: {}", errno_text),
                })?
        };

        Ok(Some(ReplicaStatus {
            io_running: text("Slave_IO_Running"),
            sql_running: text("Slave_SQL_Running"),
            last_io_errno,
            last_io_error: text("Last_IO_Error"),
            last_sql_error: text("Last_SQL_Error"),
        }))
    }
}
