//! Typed schema for the environment-driven tunables
//!
//! Each recognized `MYSQL_*` tunable maps to exactly one daemon setting,
//! with a static default, a value kind and an optional auto-tuning share.

use regex::Regex;
use std::sync::OnceLock;

use super::errors::{ValidationError, ValidationResult};
use crate::tuning::tune_percent;

/// Shape a setting's value must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    /// Decimal integer within bounds
    Integer {
        /// Inclusive lower bound
        min: u64,
        /// Inclusive upper bound
        max: u64,
    },
    /// Byte size, optionally suffixed K, M or G
    Size,
    /// `0` or `1`
    Flag,
    /// One of a fixed set of values
    Choice(&'static [&'static str]),
}

impl SettingKind {
    /// Check a raw value against this kind
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            SettingKind::Integer { min, max } => value
                .parse::<u64>()
                .map(|n| n >= *min && n <= *max)
                .unwrap_or(false),
            SettingKind::Size => size_regex().is_match(value),
            SettingKind::Flag => value == "0" || value == "1",
            SettingKind::Choice(choices) => choices.contains(&value),
        }
    }

    /// Human-readable description for error messages
    pub fn describe(&self) -> String {
        match self {
            SettingKind::Integer { min, max } => format!("an integer between {} and {}", min, max),
            SettingKind::Size => "a byte size such as 512K, 64M or 1G".to_string(),
            SettingKind::Flag => "0 or 1".to_string(),
            SettingKind::Choice(choices) => format!("one of {}", choices.join(", ")),
        }
    }
}

fn size_regex() -> &'static Regex {
    static SIZE: OnceLock<Regex> = OnceLock::new();
    SIZE.get_or_init(|| Regex::new(r"^[0-9]+[KkMmGg]?$").expect("static size pattern"))
}

/// One environment-backed tunable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingSpec {
    /// Environment variable
    pub env: &'static str,
    /// Daemon option name
    pub setting: &'static str,
    /// Value used when neither env nor tuning supplies one
    pub default: &'static str,
    /// Accepted value shape
    pub kind: SettingKind,
}

impl SettingSpec {
    /// Whether the memory tuner may supply this setting
    pub fn auto_tunable(&self) -> bool {
        tune_percent(self.setting).is_some()
    }

    /// Validate a raw environment value
    pub fn check(&self, value: &str) -> ValidationResult<()> {
        if self.kind.accepts(value) {
            Ok(())
        } else {
            Err(ValidationError::InvalidSetting {
                variable: self.env,
                value: value.to_string(),
                expected: self.kind.describe(),
            })
        }
    }
}

/// Every tunable the orchestrator recognizes
pub const SETTINGS: [SettingSpec; 14] = [
    SettingSpec {
        env: "MYSQL_LOWER_CASE_TABLE_NAMES",
        setting: "lower_case_table_names",
        default: "0",
        kind: SettingKind::Choice(&["0", "1", "2"]),
    },
    SettingSpec {
        env: "MYSQL_MAX_CONNECTIONS",
        setting: "max_connections",
        default: "151",
        kind: SettingKind::Integer { min: 1, max: 100_000 },
    },
    SettingSpec {
        env: "MYSQL_MAX_ALLOWED_PACKET",
        setting: "max_allowed_packet",
        default: "200M",
        kind: SettingKind::Size,
    },
    SettingSpec {
        env: "MYSQL_FT_MIN_WORD_LEN",
        setting: "ft_min_word_len",
        default: "4",
        kind: SettingKind::Integer { min: 1, max: 84 },
    },
    SettingSpec {
        env: "MYSQL_FT_MAX_WORD_LEN",
        setting: "ft_max_word_len",
        default: "20",
        kind: SettingKind::Integer { min: 10, max: 84 },
    },
    SettingSpec {
        env: "MYSQL_AIO",
        setting: "innodb_use_native_aio",
        default: "1",
        kind: SettingKind::Flag,
    },
    SettingSpec {
        env: "MYSQL_TABLE_OPEN_CACHE",
        setting: "table_open_cache",
        default: "400",
        kind: SettingKind::Integer { min: 1, max: 524_288 },
    },
    SettingSpec {
        env: "MYSQL_KEY_BUFFER_SIZE",
        setting: "key_buffer_size",
        default: "32M",
        kind: SettingKind::Size,
    },
    SettingSpec {
        env: "MYSQL_SORT_BUFFER_SIZE",
        setting: "sort_buffer_size",
        default: "256K",
        kind: SettingKind::Size,
    },
    SettingSpec {
        env: "MYSQL_READ_BUFFER_SIZE",
        setting: "read_buffer_size",
        default: "8M",
        kind: SettingKind::Size,
    },
    SettingSpec {
        env: "MYSQL_INNODB_BUFFER_POOL_SIZE",
        setting: "innodb_buffer_pool_size",
        default: "32M",
        kind: SettingKind::Size,
    },
    SettingSpec {
        env: "MYSQL_INNODB_LOG_FILE_SIZE",
        setting: "innodb_log_file_size",
        default: "8M",
        kind: SettingKind::Size,
    },
    SettingSpec {
        env: "MYSQL_INNODB_LOG_BUFFER_SIZE",
        setting: "innodb_log_buffer_size",
        default: "8M",
        kind: SettingKind::Size,
    },
    SettingSpec {
        env: "MYSQL_LOG_QUERIES_ENABLED",
        setting: "general_log",
        default: "0",
        kind: SettingKind::Flag,
    },
];

/// Look up a spec by environment variable
pub fn spec_for_env(env: &str) -> Option<&'static SettingSpec> {
    SETTINGS.iter().find(|spec| spec.env == env)
}
