//! Declared accounts and their enforcement
//!
//! The credential set is built by validation and enforced against the
//! setup-phase daemon on every start, before the network port opens.

mod enforcer;
mod errors;
mod types;

pub use enforcer::{ensure_account, AccountAction, CredentialEnforcer, EnforcementReport};
pub use errors::{CredentialError, CredentialResult};
pub use types::{AccountScope, ApplicationAccount, Credential, CredentialSet, RootPolicy, Secret};
