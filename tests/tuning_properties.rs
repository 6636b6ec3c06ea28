//! Memory Tuning Property Tests
//!
//! - Tuned values are a fixed share of the limit, in whole megabytes
//! - Explicit overrides are never tuned
//! - Unknown limits tune nothing
//! - Tuning is deterministic

use std::collections::BTreeSet;

use mysqld_orchestrator::tuning::{MemoryTuner, TUNING_TABLE};
use proptest::prelude::*;

const MIB: u64 = 1024 * 1024;

fn overrides_strategy() -> impl Strategy<Value = BTreeSet<&'static str>> {
    proptest::sample::subsequence(
        TUNING_TABLE.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
        0..=TUNING_TABLE.len(),
    )
    .prop_map(|names| names.into_iter().collect())
}

proptest! {
    #[test]
    fn tuned_values_are_floored_shares(limit in 1u64..(1u64 << 40)) {
        let tuned = MemoryTuner::tune(Some(limit), &BTreeSet::new());
        for (setting, percent) in TUNING_TABLE {
            let expected = (limit / MIB) * percent / 100;
            match tuned.get(setting) {
                Some(value) => prop_assert_eq!(value.clone(), format!("{}M", expected)),
                None => prop_assert_eq!(expected, 0),
            }
        }
    }

    #[test]
    fn overrides_are_never_tuned(
        limit in (64 * MIB)..(1u64 << 40),
        overrides in overrides_strategy(),
    ) {
        let tuned = MemoryTuner::tune(Some(limit), &overrides);
        for name in &overrides {
            prop_assert!(!tuned.contains_key(*name));
        }
        for (setting, _) in TUNING_TABLE {
            if !overrides.contains(setting) {
                prop_assert!(tuned.contains_key(setting));
            }
        }
    }

    #[test]
    fn tuning_is_deterministic(limit in proptest::option::of(0u64..(1u64 << 40))) {
        let overrides = BTreeSet::new();
        prop_assert_eq!(
            MemoryTuner::tune(limit, &overrides),
            MemoryTuner::tune(limit, &overrides)
        );
    }
}

#[test]
fn test_no_limit_tunes_nothing() {
    assert!(MemoryTuner::tune(None, &BTreeSet::new()).is_empty());
}

#[test]
fn test_one_gigabyte() {
    let tuned = MemoryTuner::tune(Some(1024 * MIB), &BTreeSet::new());
    assert_eq!(tuned["innodb_buffer_pool_size"], "512M");
    assert_eq!(tuned["key_buffer_size"], "102M");
    assert_eq!(tuned["read_buffer_size"], "51M");
    assert_eq!(tuned["innodb_log_file_size"], "153M");
    assert_eq!(tuned["innodb_log_buffer_size"], "153M");
}
