//! Container start orchestration
//!
//! Ties the components together in a fixed order and owns the mapping
//! from failure category to process exit code.

mod errors;
mod pipeline;

pub use errors::{InitializationError, OrchestratorError, OrchestratorResult};
pub use pipeline::{Orchestrator, OrchestratorOptions};
