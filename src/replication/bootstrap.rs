//! Replication bootstrap over the admin session
//!
//! Master: create the replication account and stop there; slaves drive
//! registration. Slave: point the engine at the master with GTID
//! auto-positioning, start the threads, then poll their status under a
//! bounded retry policy until both run.

use super::errors::{ReplicationError, ReplicationResult};
use super::link::ReplicationLink;
use super::retry::RetryPolicy;
use super::role::{BootstrapState, ReplicationRole};
use crate::admin::{account, quote_literal, AdminSession};
use crate::credentials::ensure_account;
use crate::observability::{log_event_with_fields, Event};
use crate::supervisor::ShutdownSignal;

/// Drives [`BootstrapState`] for one link
pub struct ReplicationBootstrapper<'a> {
    link: &'a ReplicationLink,
    policy: RetryPolicy,
    shutdown: ShutdownSignal,
    state: BootstrapState,
}

impl<'a> ReplicationBootstrapper<'a> {
    /// Bootstrapper with the default slave retry policy
    pub fn new(link: &'a ReplicationLink, shutdown: ShutdownSignal) -> Self {
        Self {
            link,
            policy: RetryPolicy::slave_default(),
            shutdown,
            state: BootstrapState::new(),
        }
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current state
    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    /// Run the role's path to completion
    pub fn run<S: AdminSession + ?Sized>(&mut self, session: &mut S) -> ReplicationResult<()> {
        self.link.validate()?;
        match self.link.role {
            ReplicationRole::Master => self.run_master(session),
            ReplicationRole::Slave => self.run_slave(session),
            ReplicationRole::None => Err(ReplicationError::configuration_error(
                "bootstrap requested without a replication role",
            )),
        }
    }

    fn transition(
        &mut self,
        step: impl FnOnce(BootstrapState) -> ReplicationResult<BootstrapState>,
    ) -> ReplicationResult<()> {
        let current = std::mem::take(&mut self.state);
        self.state = step(current)?;

        let attempt = self
            .state
            .attempt()
            .map(|a| a.to_string())
            .unwrap_or_default();
        log_event_with_fields(
            Event::ReplicationState,
            &[
                ("role", self.link.role.as_str()),
                ("state", self.state.state_name()),
                ("attempt", &attempt),
            ],
        );
        Ok(())
    }

    fn run_master<S: AdminSession + ?Sized>(&mut self, session: &mut S) -> ReplicationResult<()> {
        let credential = &self.link.credential;
        ensure_account(session, credential)?;
        session.execute(&format!(
            "GRANT REPLICATION SLAVE ON *.* TO {}",
            account(&credential.username, credential.host())
        ))?;
        session.execute("FLUSH PRIVILEGES")?;

        self.transition(|s| s.configure(ReplicationRole::Master))
    }

    fn run_slave<S: AdminSession + ?Sized>(&mut self, session: &mut S) -> ReplicationResult<()> {
        self.transition(|s| s.configure(ReplicationRole::Slave))?;

        let master = self.link.master_address.as_deref().unwrap_or_default();
        session.execute("STOP SLAVE")?;
        session.execute(&format!(
            "CHANGE MASTER TO MASTER_HOST={}, MASTER_USER={}, MASTER_PASSWORD={}, MASTER_AUTO_POSITION=1",
            quote_literal(master),
            quote_literal(&self.link.credential.username),
            quote_literal(self.link.credential.password.expose()),
        ))?;
        session.execute("START SLAVE")?;
        self.transition(BootstrapState::connect)?;

        let mut last_reason = String::from("replication threads not running");
        loop {
            self.check_shutdown()?;

            let attempt = self.state.attempt().unwrap_or(1);
            let status = session.replica_status()?;

            match status {
                Some(status) if status.is_streaming() => {
                    return self.transition(BootstrapState::stream);
                }
                Some(status) => match status.error() {
                    Some(reason) => {
                        last_reason = reason.clone();
                        self.transition(|s| s.fail(reason))?;
                        self.backoff(attempt, &last_reason)?;
                        session.execute("STOP SLAVE")?;
                        session.execute("START SLAVE")?;
                        self.transition(BootstrapState::connect)?;
                    }
                    None => {
                        self.backoff(attempt, &last_reason)?;
                        self.transition(BootstrapState::keep_waiting)?;
                    }
                },
                None => {
                    last_reason = "no replica status reported".to_string();
                    self.backoff(attempt, &last_reason)?;
                    self.transition(BootstrapState::keep_waiting)?;
                }
            }
        }
    }

    /// Give up if the budget is spent, otherwise wait out the delay
    fn backoff(&self, attempt: u32, last_reason: &str) -> ReplicationResult<()> {
        if !self.policy.allows_retry(attempt) {
            return Err(ReplicationError::retries_exhausted(attempt, last_reason));
        }

        let delay = self.policy.delay_for(attempt);
        let attempt_text = attempt.to_string();
        let delay_text = format!("{}ms", delay.as_millis());
        log_event_with_fields(
            Event::ReplicationRetry,
            &[
                ("attempt", &attempt_text),
                ("delay", &delay_text),
                ("reason", last_reason),
            ],
        );

        if let Some(signal) = self.shutdown.sleep(delay) {
            return Err(ReplicationError::interrupted(signal));
        }
        Ok(())
    }

    fn check_shutdown(&self) -> ReplicationResult<()> {
        match self.shutdown.received() {
            Some(signal) => Err(ReplicationError::interrupted(signal)),
            None => Ok(()),
        }
    }
}
