//! Ordered environment validator
//!
//! Rules run in a fixed order and the first violation wins. Nothing here
//! touches the filesystem or spawns anything.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use super::errors::{ValidationError, ValidationResult};
use super::schema::SETTINGS;
use super::Environment;
use crate::credentials::{ApplicationAccount, Credential, CredentialSet, RootPolicy, Secret};
use crate::replication::{BinlogFormat, ReplicationLink, ReplicationRole};

/// Longest accepted user name
pub const MAX_USERNAME_LEN: usize = 32;
/// Longest accepted database name
pub const MAX_DATABASE_LEN: usize = 64;

const RESERVED_USERNAME: &str = "root";
const DEFAULT_DEFAULTS_FILE: &str = "/etc/my.cnf";

fn identifier_regex() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("static identifier pattern"))
}

fn hostname_regex() -> &'static Regex {
    static HOST: OnceLock<Regex> = OnceLock::new();
    HOST.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9.\-_]*[A-Za-z0-9])?$").expect("static host pattern")
    })
}

/// Input that passed every rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    /// Declared accounts
    pub credentials: CredentialSet,
    /// Replication link for Master/Slave starts
    pub replication: Option<ReplicationLink>,
    /// Explicit tunables from the environment, keyed by setting name
    pub explicit_settings: BTreeMap<&'static str, String>,
    /// Whether `MYSQL_BINLOG_FORMAT` was given
    pub binlog_format_explicit: bool,
    /// Base option file the generated document includes
    pub defaults_file: String,
}

/// Validates one environment snapshot for one role
pub struct Validator<'a> {
    env: &'a Environment,
}

impl<'a> Validator<'a> {
    /// Validator over an environment snapshot
    pub fn new(env: &'a Environment) -> Self {
        Self { env }
    }

    fn var(&self, name: &str) -> Option<&'a str> {
        self.env.get(name).map(String::as_str)
    }

    /// Run every rule in order
    pub fn validate(&self, role: ReplicationRole) -> ValidationResult<ValidatedInput> {
        let application = self.application_account()?;
        let root = self.root_policy()?;
        let (binlog_format, binlog_format_explicit) = self.binlog_format()?;
        let replication = self.replication_link(role, binlog_format)?;
        let explicit_settings = self.tunables()?;

        Ok(ValidatedInput {
            credentials: CredentialSet { application, root },
            replication,
            explicit_settings,
            binlog_format_explicit,
            defaults_file: self
                .var("MYSQL_DEFAULTS_FILE")
                .unwrap_or(DEFAULT_DEFAULTS_FILE)
                .to_string(),
        })
    }

    fn application_account(&self) -> ValidationResult<Option<ApplicationAccount>> {
        let user = self.var("MYSQL_USER");
        let password = self.var("MYSQL_PASSWORD");
        let database = self.var("MYSQL_DATABASE");

        let (user, password) = match (user, password) {
            (Some(u), Some(p)) => (u, p),
            (Some(_), None) => {
                return Err(ValidationError::UnpairedCredentials {
                    present: "MYSQL_USER",
                    missing: "MYSQL_PASSWORD",
                })
            }
            (None, Some(_)) => {
                return Err(ValidationError::UnpairedCredentials {
                    present: "MYSQL_PASSWORD",
                    missing: "MYSQL_USER",
                })
            }
            (None, None) => {
                if database.is_some() {
                    return Err(ValidationError::DatabaseWithoutAccount);
                }
                return Ok(None);
            }
        };
        let database = database.ok_or(ValidationError::MissingDatabase)?;

        check_username("MYSQL_USER", user)?;
        check_password("MYSQL_PASSWORD", password)?;
        check_identifier("MYSQL_DATABASE", database, MAX_DATABASE_LEN)?;

        Ok(Some(ApplicationAccount {
            credential: Credential::remote(user, Secret::new(password)),
            database: database.to_string(),
        }))
    }

    fn root_policy(&self) -> ValidationResult<RootPolicy> {
        match self.var("MYSQL_ROOT_PASSWORD") {
            Some(password) => {
                check_password("MYSQL_ROOT_PASSWORD", password)?;
                Ok(RootPolicy::RemoteWithPassword(Secret::new(password)))
            }
            None => Ok(RootPolicy::LocalOnly),
        }
    }

    fn binlog_format(&self) -> ValidationResult<(BinlogFormat, bool)> {
        match self.var("MYSQL_BINLOG_FORMAT") {
            Some(value) => BinlogFormat::parse(value)
                .map(|format| (format, true))
                .ok_or_else(|| ValidationError::InvalidSetting {
                    variable: "MYSQL_BINLOG_FORMAT",
                    value: value.to_string(),
                    expected: "statement or row".to_string(),
                }),
            None => Ok((BinlogFormat::default(), false)),
        }
    }

    fn replication_link(
        &self,
        role: ReplicationRole,
        binlog_format: BinlogFormat,
    ) -> ValidationResult<Option<ReplicationLink>> {
        if !role.is_replicating() {
            return Ok(None);
        }

        let require = |variable: &'static str| {
            self.var(variable)
                .ok_or(ValidationError::MissingReplicationSetting {
                    role: role.as_str(),
                    variable,
                })
        };

        let user = require("MYSQL_MASTER_USER")?;
        let password = require("MYSQL_MASTER_PASSWORD")?;
        check_username("MYSQL_MASTER_USER", user)?;
        if self.var("MYSQL_USER") == Some(user) {
            return Err(ValidationError::SharedReplicationAccount {
                user: user.to_string(),
            });
        }
        check_password("MYSQL_MASTER_PASSWORD", password)?;
        let credential = Credential::remote(user, Secret::new(password));

        let link = match role {
            ReplicationRole::Slave => {
                let address = require("MYSQL_MASTER_SERVICE_NAME")?;
                if address.len() > 253 || !hostname_regex().is_match(address) {
                    return Err(ValidationError::InvalidMasterAddress {
                        value: address.to_string(),
                    });
                }
                ReplicationLink::slave(address, credential, binlog_format)
            }
            _ => ReplicationLink::master(credential, binlog_format),
        };
        Ok(Some(link))
    }

    fn tunables(&self) -> ValidationResult<BTreeMap<&'static str, String>> {
        let mut explicit = BTreeMap::new();
        for spec in SETTINGS.iter() {
            if let Some(value) = self.var(spec.env) {
                spec.check(value)?;
                explicit.insert(spec.setting, value.to_string());
            }
        }
        Ok(explicit)
    }
}

fn check_username(variable: &'static str, user: &str) -> ValidationResult<()> {
    if user == RESERVED_USERNAME {
        return Err(ValidationError::ReservedUsername { variable });
    }
    check_identifier(variable, user, MAX_USERNAME_LEN)
}

fn check_identifier(variable: &'static str, value: &str, max: usize) -> ValidationResult<()> {
    if !identifier_regex().is_match(value) {
        return Err(ValidationError::InvalidIdentifier { variable });
    }
    if value.chars().count() > max {
        return Err(ValidationError::IdentifierTooLong { variable, max });
    }
    Ok(())
}

fn check_password(variable: &'static str, password: &str) -> ValidationResult<()> {
    if password.is_empty() || password.contains('\'') || password.contains('\\') {
        return Err(ValidationError::InvalidPassword { variable });
    }
    Ok(())
}
