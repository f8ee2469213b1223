//! Entry store
//!
//! The local cluster's in-memory entries, one ordered table per map.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::key::Key;

/// Per-map ordered entry tables
///
/// ## Concurrency:
/// - one RwLock over all maps (many concurrent readers, exclusive writer)
/// - all methods use `&self`
#[derive(Default)]
pub struct EntryStore {
    maps: RwLock<HashMap<String, BTreeMap<Key, Bytes>>>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, map: &str, key: &Key) -> Option<Bytes> {
        self.maps.read().get(map).and_then(|m| m.get(key).cloned())
    }

    /// Insert or overwrite; returns the previous value
    pub fn put(&self, map: &str, key: Key, value: Bytes) -> Option<Bytes> {
        self.maps
            .write()
            .entry(map.to_string())
            .or_default()
            .insert(key, value)
    }

    /// Remove; returns the value that was held
    pub fn remove(&self, map: &str, key: &Key) -> Option<Bytes> {
        self.maps.write().get_mut(map).and_then(|m| m.remove(key))
    }

    /// Empty one map; returns how many entries were dropped
    pub fn clear(&self, map: &str) -> usize {
        self.maps
            .write()
            .get_mut(map)
            .map(|m| {
                let dropped = m.len();
                m.clear();
                dropped
            })
            .unwrap_or(0)
    }

    pub fn len(&self, map: &str) -> usize {
        self.maps.read().get(map).map_or(0, |m| m.len())
    }

    pub fn is_empty(&self, map: &str) -> bool {
        self.len(map) == 0
    }

    /// Copy of the entries of one map, in key order
    pub fn entries(&self, map: &str) -> Vec<(Key, Bytes)> {
        self.maps
            .read()
            .get(map)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Names of maps that hold (or held) entries
    pub fn map_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.maps.read().keys().cloned().collect();
        names.sort();
        names
    }
}
