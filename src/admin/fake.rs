//! Scripted admin session for unit tests

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;

use super::errors::{AdminError, AdminResult};
use super::session::{AdminSession, ReplicaStatus};

fn account_regex() -> &'static Regex {
    static ACCOUNT: OnceLock<Regex> = OnceLock::new();
    ACCOUNT.get_or_init(|| Regex::new(r"'([^']*)'@'([^']*)'").unwrap())
}

/// Records statements, tracks accounts and replays replica statuses
#[derive(Debug, Default)]
pub struct FakeSession {
    /// Every statement executed, in order
    pub statements: Vec<String>,
    /// Existing `(user, host)` accounts
    pub accounts: BTreeSet<(String, String)>,
    /// Statuses returned by successive `replica_status` calls; the last
    /// one repeats once the queue is down to it
    pub statuses: VecDeque<Option<ReplicaStatus>>,
    /// Statements starting with this prefix fail
    pub fail_prefix: Option<String>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, user: &str, host: &str) -> Self {
        self.accounts.insert((user.to_string(), host.to_string()));
        self
    }

    pub fn with_statuses(mut self, statuses: Vec<Option<ReplicaStatus>>) -> Self {
        self.statuses = statuses.into();
        self
    }

    pub fn failing_on(mut self, prefix: &str) -> Self {
        self.fail_prefix = Some(prefix.to_string());
        self
    }

    /// Statements starting with `prefix`
    pub fn executed(&self, prefix: &str) -> Vec<&str> {
        self.statements
            .iter()
            .filter(|s| s.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    fn account_of(statement: &str) -> Option<(String, String)> {
        account_regex()
            .captures(statement)
            .map(|c| (c[1].to_string(), c[2].to_string()))
    }
}

impl AdminSession for FakeSession {
    fn execute(&mut self, statement: &str) -> AdminResult<()> {
        self.statements.push(statement.to_string());

        if let Some(prefix) = &self.fail_prefix {
            if statement.starts_with(prefix.as_str()) {
                return Err(AdminError::Statement {
                    statement: statement.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
        }

        if statement.starts_with("CREATE USER") {
            if let Some(account) = Self::account_of(statement) {
                self.accounts.insert(account);
            }
        } else if statement.starts_with("DROP USER") {
            if let Some(account) = Self::account_of(statement) {
                self.accounts.remove(&account);
            }
        }
        Ok(())
    }

    fn account_exists(&mut self, user: &str, host: &str) -> AdminResult<bool> {
        Ok(self.accounts.contains(&(user.to_string(), host.to_string())))
    }

    fn replica_status(&mut self) -> AdminResult<Option<ReplicaStatus>> {
        if self.statuses.len() > 1 {
            Ok(self.statuses.pop_front().flatten())
        } else {
            Ok(self.statuses.front().cloned().flatten())
        }
    }
}

/// A session the test keeps a handle to after handing it over
impl AdminSession for Rc<RefCell<FakeSession>> {
    fn execute(&mut self, statement: &str) -> AdminResult<()> {
        self.borrow_mut().execute(statement)
    }

    fn account_exists(&mut self, user: &str, host: &str) -> AdminResult<bool> {
        self.borrow_mut().account_exists(user, host)
    }

    fn replica_status(&mut self) -> AdminResult<Option<ReplicaStatus>> {
        self.borrow_mut().replica_status()
    }
}
