//! Hash maps and sets with a fixed hasher state.
//!
//! Their iteration order only depends on the sequence of insertions.

pub use hashbrown::hash_map::Entry;

/// Hashmap using [`hashbrown::HashMap`] with a [`foldhash::fast::FixedState`] hasher.
pub type HashMap<K, V> = hashbrown::hash_map::HashMap<K, V, foldhash::fast::FixedState>;

/// Hashset using [`hashbrown::HashSet`] with a [`foldhash::fast::FixedState`] hasher.
pub type HashSet<K> = hashbrown::hash_set::HashSet<K, foldhash::fast::FixedState>;
