//! Idempotent credential enforcement
//!
//! Runs on every start. The declared environment is the only source of
//! truth: existing accounts get their password reset, missing ones are
//! created, and remote root is added or dropped to match the policy.
//! `root@localhost` is never touched and stays passwordless.
//!
//! On a replicating server each side enforces its own accounts. The
//! statements are kept out of the binary log so that a slave replaying
//! the master's history never meets an account it already created.

use super::errors::{CredentialError, CredentialResult};
use super::types::{Credential, CredentialSet, RootPolicy};
use crate::admin::{account, quote_identifier, quote_literal, AdminResult, AdminSession};
use crate::observability::{log_event, log_event_with_fields, Event};

/// What happened to an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAction {
    /// Account did not exist and was created
    Created,
    /// Account existed; its password was set to the declared one
    PasswordReset,
}

impl AccountAction {
    /// Name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountAction::Created => "created",
            AccountAction::PasswordReset => "password_reset",
        }
    }
}

/// Outcome of one enforcement pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnforcementReport {
    /// Application account action, if one was declared
    pub application: Option<AccountAction>,
    /// Whether `root@'%'` exists afterwards
    pub root_remote: bool,
}

/// Create `credential` if absent, otherwise reset its password
pub fn ensure_account<S: AdminSession + ?Sized>(
    session: &mut S,
    credential: &Credential,
) -> AdminResult<AccountAction> {
    let name = account(&credential.username, credential.host());
    let password = quote_literal(credential.password.expose());

    let (statement, action, event) =
        if session.account_exists(&credential.username, credential.host())? {
            (
                format!("ALTER USER {} IDENTIFIED BY {}", name, password),
                AccountAction::PasswordReset,
                Event::AccountPasswordReset,
            )
        } else {
            (
                format!("CREATE USER {} IDENTIFIED BY {}", name, password),
                AccountAction::Created,
                Event::AccountCreated,
            )
        };

    session.execute(&statement)?;
    log_event_with_fields(
        event,
        &[("user", credential.username.as_str()), ("host", credential.host())],
    );
    Ok(action)
}

/// Reconciles accounts with a [`CredentialSet`]
pub struct CredentialEnforcer<'a> {
    credentials: &'a CredentialSet,
    binlog: bool,
}

impl<'a> CredentialEnforcer<'a> {
    /// Enforcer for one declared set
    pub fn new(credentials: &'a CredentialSet) -> Self {
        Self {
            credentials,
            binlog: true,
        }
    }

    /// Run with `sql_log_bin` off for the session
    pub fn without_binlog(mut self) -> Self {
        self.binlog = false;
        self
    }

    /// Apply the declared state; safe to repeat
    pub fn enforce<S: AdminSession + ?Sized>(
        &self,
        session: &mut S,
    ) -> CredentialResult<EnforcementReport> {
        if !self.binlog {
            session
                .execute("SET SESSION sql_log_bin = 0")
                .map_err(|e| CredentialError::reconcile("suspend binary logging", e))?;
        }

        let application = match &self.credentials.application {
            Some(app) => {
                let action = ensure_account(session, &app.credential)
                    .map_err(|e| CredentialError::reconcile("reconcile application account", e))?;

                let database = quote_identifier(&app.database);
                session
                    .execute(&format!("CREATE DATABASE IF NOT EXISTS {}", database))
                    .map_err(|e| CredentialError::reconcile("create application database", e))?;
                session
                    .execute(&format!(
                        "GRANT ALL ON {}.* TO {}",
                        database,
                        account(&app.credential.username, app.credential.host())
                    ))
                    .map_err(|e| CredentialError::reconcile("grant database access", e))?;
                Some(action)
            }
            None => None,
        };

        let root_remote = match &self.credentials.root {
            RootPolicy::RemoteWithPassword(password) => {
                let root = Credential::remote("root", password.clone());
                ensure_account(session, &root)
                    .map_err(|e| CredentialError::reconcile("set remote root password", e))?;
                session
                    .execute(&format!(
                        "GRANT ALL ON *.* TO {} WITH GRANT OPTION",
                        account("root", root.host())
                    ))
                    .map_err(|e| CredentialError::reconcile("grant remote root privileges", e))?;
                log_event(Event::RootRemoteEnabled);
                true
            }
            RootPolicy::LocalOnly => {
                session
                    .execute(&format!("DROP USER IF EXISTS {}", account("root", "%")))
                    .map_err(|e| CredentialError::reconcile("remove remote root", e))?;
                log_event(Event::RootRemoteDisabled);
                false
            }
        };

        session
            .execute("FLUSH PRIVILEGES")
            .map_err(|e| CredentialError::reconcile("flush privileges", e))?;

        if !self.binlog {
            session
                .execute("SET SESSION sql_log_bin = 1")
                .map_err(|e| CredentialError::reconcile("resume binary logging", e))?;
        }

        log_event_with_fields(
            Event::CredentialsEnforced,
            &[
                (
                    "application",
                    application.map(|a| a.as_str()).unwrap_or("none"),
                ),
                ("root_remote", if root_remote { "true" } else { "false" }),
            ],
        );

        Ok(EnforcementReport {
            application,
            root_remote,
        })
    }
}
