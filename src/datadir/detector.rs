//! Initialization state detection
//!
//! The data directory's own contents are the only record of a previous
//! start. The engine's system schema lives in `<datadir>/mysql`; without
//! it the directory has never been initialized, whatever else it holds.

use std::fs;
use std::io;
use std::path::Path;

use super::errors::{DataDirError, DataDirResult};
use crate::observability::{log_event_with_fields, Event};

/// Directory the engine creates for its system schema
pub const SYSTEM_SCHEMA_DIR: &str = "mysql";

/// Whether this start finds an initialized data directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializationState {
    /// Never initialized; engine bootstrap required
    Pristine,
    /// Initialized by a previous start
    Existing,
}

impl InitializationState {
    /// Name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            InitializationState::Pristine => "pristine",
            InitializationState::Existing => "existing",
        }
    }

    /// Whether engine bootstrap must run
    pub fn needs_bootstrap(&self) -> bool {
        *self == InitializationState::Pristine
    }
}

/// Classifies a data directory
pub struct InitStateDetector;

impl InitStateDetector {
    /// Inspect `data_dir`.
    ///
    /// Absent or lacking the system schema → Pristine. Entries the engine
    /// does not own (`lost+found` on a fresh volume) are tolerated.
    pub fn detect(data_dir: &Path) -> DataDirResult<InitializationState> {
        let path = data_dir.display().to_string();

        let entries = match fs::read_dir(data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log_event_with_fields(
                    Event::InitStateDetected,
                    &[("state", "pristine"), ("datadir", &path), ("reason", "absent")],
                );
                return Ok(InitializationState::Pristine);
            }
            Err(_) if data_dir.exists() && !data_dir.is_dir() => {
                return Err(DataDirError::not_a_directory(&path));
            }
            Err(e) => return Err(DataDirError::unreadable(&path, e)),
        };

        let mut foreign = 0usize;
        let mut has_system_schema = false;
        for entry in entries {
            let entry = entry.map_err(|e| DataDirError::unreadable(&path, e))?;
            if entry.file_name() == SYSTEM_SCHEMA_DIR && entry.path().is_dir() {
                has_system_schema = true;
            } else {
                foreign += 1;
            }
        }

        let state = if has_system_schema {
            InitializationState::Existing
        } else {
            InitializationState::Pristine
        };

        let foreign = foreign.to_string();
        log_event_with_fields(
            Event::InitStateDetected,
            &[
                ("state", state.as_str()),
                ("datadir", &path),
                ("other_entries", &foreign),
            ],
        );
        Ok(state)
    }
}
