//! Configuration resolution for one start
//!
//! Input is an environment snapshot, a memory limit and the user's option
//! file fragments. Output is a validated, immutable [`ResolvedStart`]:
//! the daemon settings with provenance plus the declared accounts and
//! replication link.

mod document;
mod errors;
mod fragments;
mod resolver;
mod schema;
mod validator;

use std::collections::BTreeMap;

pub use document::{normalize_option_name, Configuration, OptionSection, Provenance, Setting};
pub use errors::{ValidationError, ValidationResult};
pub use fragments::{substitute, ConfigFragment, FragmentSection, RawFragment};
pub use resolver::{ConfigResolver, ResolvedStart, DEFAULT_PORT};
pub use schema::{spec_for_env, SettingKind, SettingSpec, SETTINGS};
pub use validator::{ValidatedInput, Validator, MAX_DATABASE_LEN, MAX_USERNAME_LEN};

/// Environment snapshot, captured once at startup
pub type Environment = BTreeMap<String, String>;

/// Snapshot the process environment
pub fn capture_environment() -> Environment {
    std::env::vars().collect()
}
