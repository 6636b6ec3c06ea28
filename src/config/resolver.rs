//! Configuration resolution
//!
//! Validate first, then layer defaults, tuned values, environment values,
//! replication settings and user fragments into one [`Configuration`].
//! Nothing is written here; the caller decides where the document goes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::document::{Configuration, Provenance};
use super::errors::ValidationResult;
use super::fragments::RawFragment;
use super::schema::SETTINGS;
use super::validator::Validator;
use super::Environment;
use crate::credentials::CredentialSet;
use crate::observability::{log_event_with_fields, Event};
use crate::replication::{HostIdentity, ReplicationLink, ReplicationRole};
use crate::tuning::MemoryTuner;

/// Port the long-lived daemon listens on
pub const DEFAULT_PORT: u16 = 3306;

/// Everything one start needs, produced once and passed by reference
#[derive(Debug, Clone)]
pub struct ResolvedStart {
    /// Requested role
    pub role: ReplicationRole,
    /// Final daemon settings
    pub configuration: Configuration,
    /// Accounts to enforce
    pub credentials: CredentialSet,
    /// Replication link, for Master/Slave
    pub replication: Option<ReplicationLink>,
}

/// Turns one environment snapshot into a [`ResolvedStart`]
pub struct ConfigResolver<'a> {
    env: &'a Environment,
    data_dir: PathBuf,
    socket: PathBuf,
    memory_limit: Option<u64>,
    identity: Option<HostIdentity>,
}

impl<'a> ConfigResolver<'a> {
    /// Resolver for a data directory and daemon socket
    pub fn new(env: &'a Environment, data_dir: impl Into<PathBuf>, socket: impl Into<PathBuf>) -> Self {
        Self {
            env,
            data_dir: data_dir.into(),
            socket: socket.into(),
            memory_limit: None,
            identity: None,
        }
    }

    /// Memory limit to tune against
    pub fn with_memory_limit(mut self, memory_limit: Option<u64>) -> Self {
        self.memory_limit = memory_limit;
        self
    }

    /// Host identity used for replication settings; detected if not given
    pub fn with_identity(mut self, identity: HostIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Validate and merge.
    ///
    /// Fails with the first validation error before anything is produced.
    pub fn resolve(
        &self,
        role: ReplicationRole,
        fragments: &[RawFragment],
    ) -> ValidationResult<ResolvedStart> {
        let input = Validator::new(self.env).validate(role)?;

        let mut configuration = Configuration::new();
        let defaults_file = Path::new(&input.defaults_file);
        if defaults_file.is_file() {
            configuration = configuration.with_include(defaults_file);
        }

        self.apply_base(&mut configuration);

        for spec in SETTINGS.iter() {
            configuration.apply(spec.setting, spec.default, Provenance::Default);
        }

        let overrides: BTreeSet<&str> = input.explicit_settings.keys().copied().collect();
        for (setting, value) in MemoryTuner::tune(self.memory_limit, &overrides) {
            configuration.apply(&setting, value, Provenance::AutoTuned);
        }

        for (setting, value) in &input.explicit_settings {
            configuration.apply(setting, value.as_str(), Provenance::Env);
        }

        if let Some(link) = &input.replication {
            let identity = self.identity.clone().unwrap_or_else(HostIdentity::detect);
            for (setting, value) in link.daemon_settings(&self.data_dir, &identity) {
                configuration.apply(&setting, value, Provenance::Env);
            }
        }

        let vars = self.substitution_vars(&configuration);
        for raw in fragments {
            let fragment = raw.render(&vars)?;
            let source = fragment.path.display().to_string();
            for section in &fragment.sections {
                if section.is_server() {
                    for (key, value) in &section.entries {
                        configuration.apply_from(
                            key,
                            value.clone().unwrap_or_default(),
                            Provenance::UserFile,
                            Some(&source),
                        );
                    }
                } else {
                    configuration.extend_section(&section.name, &section.entries);
                }
            }
        }

        let user_file = configuration
            .settings()
            .filter(|(_, s)| s.provenance == Provenance::UserFile)
            .count()
            .to_string();
        let tuned = configuration
            .settings()
            .filter(|(_, s)| s.provenance == Provenance::AutoTuned)
            .count()
            .to_string();
        let settings = configuration.len().to_string();
        let fragment_count = fragments.len().to_string();
        log_event_with_fields(
            Event::ConfigResolved,
            &[
                ("role", role.as_str()),
                ("settings", &settings),
                ("auto_tuned", &tuned),
                ("user_file", &user_file),
                ("fragments", &fragment_count),
            ],
        );

        Ok(ResolvedStart {
            role,
            configuration,
            credentials: input.credentials,
            replication: input.replication,
        })
    }

    fn apply_base(&self, configuration: &mut Configuration) {
        let data_dir = self.data_dir.display().to_string();
        configuration.apply("datadir", data_dir.as_str(), Provenance::Default);
        configuration.apply(
            "socket",
            self.socket.display().to_string(),
            Provenance::Default,
        );
        configuration.apply("port", DEFAULT_PORT.to_string(), Provenance::Default);
        configuration.apply("skip_name_resolve", "ON", Provenance::Default);
        configuration.apply(
            "general_log_file",
            self.data_dir.join("mysql-query.log").display().to_string(),
            Provenance::Default,
        );
    }

    /// Process environment overlaid with the resolved tunable values
    fn substitution_vars(&self, configuration: &Configuration) -> Environment {
        let mut vars = self.env.clone();
        for spec in SETTINGS.iter() {
            if let Some(value) = configuration.value(spec.setting) {
                vars.insert(spec.env.to_string(), value.to_string());
            }
        }
        vars.insert(
            "MYSQL_DATADIR".to_string(),
            self.data_dir.display().to_string(),
        );
        vars
    }
}
