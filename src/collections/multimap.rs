// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Map from one key to a set of values

use ahash::{AHashMap, AHashSet};
use std::hash::Hash;

/// Key to value-set index; a value is stored at most once per key
#[derive(Debug, Clone)]
pub struct MultiMap<K, V> {
    entries: AHashMap<K, AHashSet<V>>,
}

impl<K, V> Default for MultiMap<K, V>
where
    K: Eq + Hash,
    V: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MultiMap<K, V>
where
    K: Eq + Hash,
    V: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            entries: AHashMap::new(),
        }
    }

    /// Returns false if the pair was already present
    pub fn add(&mut self, key: K, value: V) -> bool {
        self.entries.entry(key).or_default().insert(value)
    }

    /// Remove one pair; the key disappears with its last value
    pub fn remove(&mut self, key: &K, value: &V) -> bool {
        let Some(values) = self.entries.get_mut(key) else {
            return false;
        };
        let removed = values.remove(value);
        if values.is_empty() {
            self.entries.remove(key);
        }
        removed
    }

    pub fn remove_key(&mut self, key: &K) -> Option<AHashSet<V>> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &K) -> Option<&AHashSet<V>> {
        self.entries.get(key)
    }

    /// Number of values stored under `key`
    pub fn count(&self, key: &K) -> usize {
        self.entries.get(key).map_or(0, |values| values.len())
    }

    pub fn contains(&self, key: &K, value: &V) -> bool {
        self.entries
            .get(key)
            .is_some_and(|values| values.contains(value))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &AHashSet<V>)> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
