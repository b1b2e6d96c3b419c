// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section tables: one numbered entry per distinct property combination

use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Interning table numbering keys from 1 in first-seen order
#[derive(Clone, Debug)]
pub struct SectionTable<K> {
    index: FxHashMap<K, usize>,
    keys: Vec<K>,
}

impl<K> Default for SectionTable<K> {
    fn default() -> Self {
        Self {
            index: FxHashMap::default(),
            keys: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> SectionTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of a key, adding it when first seen
    pub fn intern(&mut self, key: K) -> usize {
        if let Some(&number) = self.index.get(&key) {
            return number;
        }
        self.keys.push(key.clone());
        let number = self.keys.len();
        self.index.insert(key, number);
        number
    }

    /// Number of a known key
    pub fn get(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Entries with their numbers, in numbering order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &K)> {
        self.keys.iter().enumerate().map(|(i, key)| (i + 1, key))
    }
}

/// Hashable real number for section keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RealKey(u64);

impl RealKey {
    pub fn new(value: f64) -> Self {
        // -0.0 and 0.0 describe the same section
        let value = if value == 0.0 { 0.0 } else { value };
        Self(value.to_bits())
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.0)
    }
}

impl From<f64> for RealKey {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}
