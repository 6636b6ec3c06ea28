//! Credential model
//!
//! Passwords are wrapped in [`Secret`] so they never reach logs or
//! `Debug` output by accident.

use std::fmt;

/// A password that only reveals itself on request
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a password
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plain password, for building admin statements only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Where an account may connect from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountScope {
    /// Local socket connections only
    LocalOnly,
    /// Any host
    Remote,
}

impl AccountScope {
    /// Host part of the account name
    pub fn host(&self) -> &'static str {
        match self {
            AccountScope::LocalOnly => "localhost",
            AccountScope::Remote => "%",
        }
    }
}

/// A database account and its declared password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Account user name
    pub username: String,
    /// Declared password
    pub password: Secret,
    /// Connection scope
    pub scope: AccountScope,
}

impl Credential {
    /// Remote-scoped account
    pub fn remote(username: impl Into<String>, password: Secret) -> Self {
        Self {
            username: username.into(),
            password,
            scope: AccountScope::Remote,
        }
    }

    /// Host part of the account name
    pub fn host(&self) -> &'static str {
        self.scope.host()
    }
}

/// The operator-requested non-root account and its database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationAccount {
    /// Account credential (always remote-scoped)
    pub credential: Credential,
    /// Database the account owns
    pub database: String,
}

/// What the root account should look like after enforcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootPolicy {
    /// `root@'%'` exists with this password; local root stays passwordless
    RemoteWithPassword(Secret),
    /// Only passwordless local root; no remote root account
    LocalOnly,
}

/// Validated credential declarations for one start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSet {
    /// Application account, if requested
    pub application: Option<ApplicationAccount>,
    /// Root account policy
    pub root: RootPolicy,
}

impl Default for CredentialSet {
    fn default() -> Self {
        Self {
            application: None,
            root: RootPolicy::LocalOnly,
        }
    }
}
