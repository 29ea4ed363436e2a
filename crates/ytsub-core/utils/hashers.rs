//! Hash map and set constructors backed by ahash
//!
//! Lookup tables (tag registry, attribute deduplication) use these. Output
//! order never depends on hash iteration order: tables that are written out
//! keep their own insertion-ordered entry list.

use ahash::RandomState;
use std::collections::{HashMap, HashSet};

/// Create a new `HashMap` with the ahash hasher
///
/// # Example
///
/// ```rust
/// use ytsub_core::utils::hashers::create_hash_map;
///
/// let mut map = create_hash_map::<String, i32>();
/// map.insert("key".to_string(), 42);
/// ```
#[must_use]
pub fn create_hash_map<K, V>() -> HashMap<K, V, RandomState> {
    HashMap::with_hasher(RandomState::new())
}

/// Create a new `HashMap` with pre-allocated capacity
#[must_use]
pub fn create_hash_map_with_capacity<K, V>(capacity: usize) -> HashMap<K, V, RandomState> {
    HashMap::with_capacity_and_hasher(capacity, RandomState::new())
}

/// Create a new `HashSet` with the ahash hasher
#[must_use]
pub fn create_hash_set<T>() -> HashSet<T, RandomState> {
    HashSet::with_hasher(RandomState::new())
}
