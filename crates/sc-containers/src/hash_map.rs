//! Separate-chaining hash map.
//!
//! Buckets are a power-of-two `Vec` of entry chains. The table doubles when
//! an insert would push `len` past `bucket_count * load_factor`.
//!
//! Unlike the list, the map is not internally synchronized: mutation takes
//! `&mut self`, and callers that share it wrap it in their own lock.

use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use sc_core::invariants::hash_map::{BucketView, HashMapProperties};
use sc_core::ConfigError;

/// Sizing parameters for `HashMapLesson`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Initial bucket count; must be a power of two.
    pub initial_capacity: usize,
    /// Maximum entries per bucket on average before the table grows.
    pub load_factor: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            load_factor: 0.75,
        }
    }
}

impl MapConfig {
    /// Configuration for maps expected to stay small.
    pub fn compact() -> Self {
        Self {
            initial_capacity: 2,
            load_factor: 1.0,
        }
    }

    /// # Errors
    ///
    /// `ConfigError` when the capacity is zero or not a power of two, or the
    /// load factor is outside `(0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !self.initial_capacity.is_power_of_two() {
            return Err(ConfigError::CapacityNotPowerOfTwo(self.initial_capacity));
        }
        if self.load_factor.is_nan() || self.load_factor <= 0.0 || self.load_factor > 1.0 {
            return Err(ConfigError::InvalidLoadFactor(self.load_factor));
        }
        Ok(())
    }
}

/// Hash map with `insert` / `get` / `delete`.
///
/// `insert` never overwrites: inserting an existing key keeps the stored
/// value and returns `false`.
///
/// ```
/// use sc_containers::HashMapLesson;
///
/// let mut map = HashMapLesson::new();
/// assert!(map.insert(1, "one"));
/// assert!(!map.insert(1, "uno"));
/// assert_eq!(map.get(&1), Some(&"one"));
/// map.delete(&1);
/// assert_eq!(map.get(&1), None);
/// ```
pub struct HashMapLesson<K, V, S = RandomState> {
    buckets: Vec<Vec<(K, V)>>,
    len: usize,
    load_factor: f64,
    hash_builder: S,
}

impl<K: Hash + Eq, V> HashMapLesson<K, V, RandomState> {
    #[must_use]
    pub fn new() -> Self {
        Self::build(MapConfig::default(), RandomState::new())
    }

    /// # Errors
    ///
    /// See [`MapConfig::validate`].
    pub fn with_config(config: MapConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> HashMapLesson<K, V, S> {
    /// # Errors
    ///
    /// See [`MapConfig::validate`].
    pub fn with_config_and_hasher(config: MapConfig, hash_builder: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, hash_builder))
    }

    fn build(config: MapConfig, hash_builder: S) -> Self {
        let mut buckets = Vec::with_capacity(config.initial_capacity);
        buckets.resize_with(config.initial_capacity, Vec::new);
        Self {
            buckets,
            len: 0,
            load_factor: config.load_factor,
            hash_builder,
        }
    }

    fn bucket_index(&self, key: &K) -> usize {
        (self.hash_builder.hash_one(key) as usize) & (self.buckets.len() - 1)
    }

    /// Add `key -> value`. Returns `false`, leaving the map unchanged, if
    /// `key` is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.contains_key(&key) {
            return false;
        }
        // A small load factor can need several doublings for one insert.
        while (self.len + 1) as f64 > self.buckets.len() as f64 * self.load_factor {
            self.grow();
        }
        let index = self.bucket_index(&key);
        self.buckets[index].push((key, value));
        self.len += 1;
        true
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.buckets[self.bucket_index(key)]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Remove the mapping for `key`, returning its value if it was present.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let index = self.bucket_index(key);
        let bucket = &mut self.buckets[index];
        let position = bucket.iter().position(|(k, _)| k == key)?;
        let (_, value) = bucket.swap_remove(position);
        self.len -= 1;
        Some(value)
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.buckets.iter().flatten().map(|(k, v)| (k, v))
    }

    fn grow(&mut self) {
        let new_count = self.buckets.len() * 2;
        let mut buckets = Vec::with_capacity(new_count);
        buckets.resize_with(new_count, Vec::new);
        let old = std::mem::replace(&mut self.buckets, buckets);
        for (key, value) in old.into_iter().flatten() {
            let index = self.bucket_index(&key);
            self.buckets[index].push((key, value));
        }
        tracing::debug!(buckets = new_count, len = self.len, "hash map resized");
    }
}

impl<K: Hash + Eq, V> Default for HashMapLesson<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + fmt::Debug, V: fmt::Debug, S: BuildHasher> fmt::Debug for HashMapLesson<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V, S: BuildHasher> HashMapProperties for HashMapLesson<u64, V, S> {
    fn bucket_view(&self) -> BucketView {
        let mut view = BucketView {
            declared_len: self.len,
            load_factor: self.load_factor,
            ..BucketView::default()
        };
        for (index, bucket) in self.buckets.iter().enumerate() {
            let keys: Vec<u64> = bucket.iter().map(|(k, _)| *k).collect();
            for key in &keys {
                if self.bucket_index(key) != index {
                    view.misplaced.push(*key);
                }
            }
            view.buckets.push(keys);
        }
        view
    }
}
