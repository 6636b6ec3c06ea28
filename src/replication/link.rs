//! Replication link configuration
//!
//! Built once from validated input, immutable after startup. A slave
//! always knows its master's address; a master never has one.

use std::path::Path;

use super::errors::{ReplicationError, ReplicationResult};
use super::identity::HostIdentity;
use super::role::ReplicationRole;
use crate::credentials::Credential;

/// Binlog event format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinlogFormat {
    /// Full statements
    #[default]
    Statement,
    /// Full row images
    Row,
}

impl BinlogFormat {
    /// Parse the `MYSQL_BINLOG_FORMAT` value, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "statement" => Some(BinlogFormat::Statement),
            "row" => Some(BinlogFormat::Row),
            _ => None,
        }
    }

    /// Daemon option value
    pub fn as_str(&self) -> &'static str {
        match self {
            BinlogFormat::Statement => "STATEMENT",
            BinlogFormat::Row => "ROW",
        }
    }
}

/// Everything one side of the pair needs to bootstrap replication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationLink {
    /// Master or Slave
    pub role: ReplicationRole,
    /// Master address (slave only)
    pub master_address: Option<String>,
    /// Replication account
    pub credential: Credential,
    /// Binlog format
    pub binlog_format: BinlogFormat,
}

impl ReplicationLink {
    /// Master side of the pair
    pub fn master(credential: Credential, binlog_format: BinlogFormat) -> Self {
        Self {
            role: ReplicationRole::Master,
            master_address: None,
            credential,
            binlog_format,
        }
    }

    /// Slave side of the pair
    pub fn slave(
        master_address: impl Into<String>,
        credential: Credential,
        binlog_format: BinlogFormat,
    ) -> Self {
        Self {
            role: ReplicationRole::Slave,
            master_address: Some(master_address.into()),
            credential,
            binlog_format,
        }
    }

    /// Check role-specific invariants
    pub fn validate(&self) -> ReplicationResult<()> {
        match self.role {
            ReplicationRole::None => Err(ReplicationError::configuration_error(
                "replication link without a role",
            )),
            ReplicationRole::Master => {
                if self.master_address.is_some() {
                    return Err(ReplicationError::configuration_error(
                        "master must not have a master address",
                    ));
                }
                Ok(())
            }
            ReplicationRole::Slave => match self.master_address.as_deref() {
                Some(addr) if !addr.is_empty() => Ok(()),
                _ => Err(ReplicationError::configuration_error(
                    "slave requires a master address",
                )),
            },
        }
    }

    /// Daemon settings this role needs, as (option, value) pairs
    pub fn daemon_settings(
        &self,
        data_dir: &Path,
        identity: &HostIdentity,
    ) -> Vec<(String, String)> {
        let mut settings = vec![
            ("server_id".to_string(), identity.server_id().to_string()),
            (
                "log_bin".to_string(),
                data_dir.join("mysql-bin.log").display().to_string(),
            ),
            ("binlog_format".to_string(), self.binlog_format.as_str().to_string()),
            ("gtid_mode".to_string(), "ON".to_string()),
            ("enforce_gtid_consistency".to_string(), "ON".to_string()),
        ];

        if self.role == ReplicationRole::Slave {
            settings.push((
                "relay_log".to_string(),
                data_dir.join("mysql-relay-bin.log").display().to_string(),
            ));
            settings.push(("report_host".to_string(), identity.address.clone()));
        }

        settings
    }
}
