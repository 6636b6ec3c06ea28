//! Persistent data directory
//!
//! Classifies the directory once per start and, on a pristine start,
//! runs the engine's one-time initialization.

mod bootstrap;
mod detector;
mod errors;

pub use bootstrap::DataDirBootstrapper;
pub use detector::{InitStateDetector, InitializationState, SYSTEM_SCHEMA_DIR};
pub use errors::{DataDirError, DataDirErrorCode, DataDirResult};
