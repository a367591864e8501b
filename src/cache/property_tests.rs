//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the memory table, the key builders and the
//! manager's read/write paths over generated inputs.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{keys, CacheManager, DurableStore, MemoryTable};
use crate::config::CacheConfig;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const HOUR: Duration = Duration::from_secs(3600);

// == Strategies ==
/// Colon-delimited keys in the shape the key builders produce
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-z-]{1,12}:[a-zA-Z0-9_\u{4e00}-\u{4e20}]{1,24}".prop_map(|s| s)
}

/// Arbitrary payload bytes, including invalid UTF-8
fn valid_value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

fn unique_keys(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

fn test_manager() -> CacheManager {
    CacheManager::with_durable(CacheConfig::default(), DurableStore::in_memory().unwrap()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Set followed by get returns the exact bytes
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut table = MemoryTable::new(TEST_MAX_ENTRIES);

        table.set(&key, value.clone(), HOUR);

        prop_assert_eq!(table.get(&key), Some(value));
    }

    // The last write to a key wins and leaves a single entry
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        first in valid_value_strategy(),
        second in valid_value_strategy()
    ) {
        let mut table = MemoryTable::new(TEST_MAX_ENTRIES);

        table.set(&key, first, HOUR);
        table.set(&key, second.clone(), HOUR);

        prop_assert_eq!(table.get(&key), Some(second));
        prop_assert_eq!(table.len(), 1);
    }

    // The table never holds more than its capacity
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            1..200
        )
    ) {
        let max_entries = 50;
        let mut table = MemoryTable::new(max_entries);

        for (key, value) in entries {
            table.set(&key, value, HOUR);
            prop_assert!(
                table.len() <= max_entries,
                "Table size {} exceeds max {}",
                table.len(),
                max_entries
            );
        }
    }

    // Filling a full table evicts the least recently used key, and a read
    // counts as a use
    #[test]
    fn prop_lru_eviction_respects_reads(
        keys in prop::collection::vec(valid_key_strategy(), 3..10),
        new_key in valid_key_strategy()
    ) {
        let keys = unique_keys(keys);
        prop_assume!(keys.len() >= 3);
        prop_assume!(!keys.contains(&new_key));

        let mut table = MemoryTable::new(keys.len());
        for key in &keys {
            table.set(key, key.as_bytes().to_vec(), HOUR);
        }

        // keys[0] is refreshed, so keys[1] becomes the eviction candidate
        prop_assert!(table.get(&keys[0]).is_some());
        table.set(&new_key, b"new".to_vec(), HOUR);

        prop_assert_eq!(table.len(), keys.len());
        prop_assert!(table.get(&keys[0]).is_some());
        prop_assert!(table.get(&keys[1]).is_none());
        prop_assert!(table.get(&new_key).is_some());
    }

    // Any permutation of the same ingredient set yields the same key
    #[test]
    fn prop_ingredient_key_is_order_independent(
        ids in prop::collection::vec("[a-z\u{4e00}-\u{4e20}]{1,6}", 0..8),
        seed in any::<u64>()
    ) {
        let mut shuffled = ids.clone();
        // Deterministic shuffle driven by the generated seed
        let len = shuffled.len();
        if len > 1 {
            let mut state = seed;
            for i in (1..len).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }
        }

        prop_assert_eq!(
            keys::recipes_by_ingredients_key(&ids),
            keys::recipes_by_ingredients_key(&shuffled)
        );
    }

    // The preference segment is always empty or exactly 8 hex chars
    #[test]
    fn prop_preference_hash_shape(preference in ".{0,64}") {
        let hash = keys::preference_hash(&preference);
        if preference.is_empty() {
            prop_assert!(hash.is_empty());
        } else {
            prop_assert_eq!(hash.len(), 8);
            prop_assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}

// Manager properties touch SQLite, so fewer cases
proptest! {
    #![proptest_config(ProptestConfig::with_cases(25))]

    // Bytes written through the manager read back unchanged, and nothing is
    // readable once the manager is closed
    #[test]
    fn prop_manager_round_trip_until_close(
        key in valid_key_strategy(),
        value in valid_value_strategy()
    ) {
        let manager = test_manager();
        manager.set(&key, value.clone()).unwrap();

        prop_assert_eq!(manager.get(&key), Some(value.clone()));

        manager.close().unwrap();
        prop_assert_eq!(manager.get(&key), None);
    }

    // Raw bytes that are not JSON never decode, they read as a miss
    #[test]
    fn prop_get_json_miss_on_garbage(
        key in valid_key_strategy(),
        garbage in prop::collection::vec(0x80u8..=0xff, 1..64)
    ) {
        let manager = test_manager();
        manager.set(&key, garbage).unwrap();

        prop_assert!(manager.get_json::<serde_json::Value>(&key).is_none());
        prop_assert!(manager.get(&key).is_some());
    }
}
