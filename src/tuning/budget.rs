//! Container memory budget
//!
//! Read once at startup from the cgroup filesystem. cgroup v2 is tried
//! first, then v1. Anything unreadable means "no limit known".

use std::fs;
use std::path::Path;

use crate::observability::{log_event_with_fields, Event};

/// Limits at or above this are how cgroups spell "unlimited"
pub const UNLIMITED_THRESHOLD: u64 = 1 << 62;

const CGROUP_V2_FILE: &str = "memory.max";
const CGROUP_V1_FILE: &str = "memory/memory.limit_in_bytes";

/// Memory available to the container, immutable once read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceBudget {
    memory_limit: Option<u64>,
}

impl ResourceBudget {
    /// Budget with an explicit limit
    pub fn with_limit(bytes: u64) -> Self {
        Self {
            memory_limit: Some(bytes).filter(|b| *b > 0 && *b < UNLIMITED_THRESHOLD),
        }
    }

    /// Budget without a known limit
    pub fn unlimited() -> Self {
        Self { memory_limit: None }
    }

    /// Detect the limit below `cgroup_root` (normally `/sys/fs/cgroup`)
    pub fn detect(cgroup_root: &Path) -> Self {
        for relative in [CGROUP_V2_FILE, CGROUP_V1_FILE] {
            let path = cgroup_root.join(relative);
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(_) => continue,
            };
            let path_str = path.display().to_string();
            return match parse_limit(&content) {
                Some(limit) => Self::with_limit(limit),
                None => {
                    log_event_with_fields(
                        Event::MemoryLimitUnbounded,
                        &[("path", &path_str), ("value", content.trim())],
                    );
                    Self::unlimited()
                }
            };
        }
        Self::unlimited()
    }

    /// Memory limit in bytes, if one is known
    pub fn memory_limit(&self) -> Option<u64> {
        self.memory_limit
    }
}

fn parse_limit(content: &str) -> Option<u64> {
    let trimmed = content.trim();
    if trimmed == "max" {
        return None;
    }
    trimmed
        .parse::<u64>()
        .ok()
        .filter(|limit| *limit > 0 && *limit < UNLIMITED_THRESHOLD)
}
