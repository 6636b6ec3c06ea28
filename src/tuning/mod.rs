//! Memory-proportional tuning
//!
//! A fixed table maps daemon settings to a share of the container memory
//! limit. Tuning is pure: the same limit and overrides always yield the
//! same values, and an unknown limit yields nothing at all.

mod budget;

use std::collections::{BTreeMap, BTreeSet};

pub use budget::{ResourceBudget, UNLIMITED_THRESHOLD};

const MIB: u64 = 1024 * 1024;

/// (setting, percent of memory limit)
pub const TUNING_TABLE: [(&str, u64); 5] = [
    ("key_buffer_size", 10),
    ("read_buffer_size", 5),
    ("innodb_buffer_pool_size", 50),
    ("innodb_log_file_size", 15),
    ("innodb_log_buffer_size", 15),
];

/// Returns the tuning percentage for a setting, if it is auto-tunable
pub fn tune_percent(setting: &str) -> Option<u64> {
    TUNING_TABLE
        .iter()
        .find(|(name, _)| *name == setting)
        .map(|(_, percent)| *percent)
}

/// Computes memory-proportional values for the tuning table
pub struct MemoryTuner;

impl MemoryTuner {
    /// Tune every table entry not present in `overrides`.
    ///
    /// Values are whole megabytes rendered with an `M` suffix. Entries that
    /// floor to zero are left out so the static default applies.
    pub fn tune(
        memory_limit: Option<u64>,
        overrides: &BTreeSet<&str>,
    ) -> BTreeMap<String, String> {
        let mut tuned = BTreeMap::new();
        let limit_mb = match memory_limit {
            Some(bytes) if bytes > 0 => bytes / MIB,
            _ => return tuned,
        };

        for (setting, percent) in TUNING_TABLE {
            if overrides.contains(setting) {
                continue;
            }
            let value_mb = limit_mb * percent / 100;
            if value_mb == 0 {
                continue;
            }
            tuned.insert(setting.to_string(), format!("{}M", value_mb));
        }

        tuned
    }
}
