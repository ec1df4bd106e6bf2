//! Prefix-bucketed name lookup.
//!
//! Names are bucketed by their first `k` characters. A lookup returns the
//! whole bucket; callers filter by exact name. Sharing a bucket between
//! names with a common prefix costs a few extra comparisons and avoids a
//! scan of every item of the type.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::types::{ItemId, ItemType};

/// Leading `prefix_len` characters of `name`, on a char boundary.
fn prefix(name: &str, prefix_len: usize) -> &str {
    name.char_indices()
        .nth(prefix_len)
        .map_or(name, |(end, _)| &name[..end])
}

/// Name-prefix buckets for the items of one type.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    prefix_len: usize,
    buckets: HashMap<String, Vec<ItemId>>,
}

impl NameIndex {
    /// Create an empty index.
    pub fn new(prefix_len: usize) -> Self {
        Self {
            prefix_len,
            buckets: HashMap::new(),
        }
    }

    /// Build an index over `(id, name)` pairs.
    pub fn build<'a, I>(prefix_len: usize, entries: I) -> Self
    where
        I: IntoIterator<Item = (ItemId, &'a str)>,
    {
        let mut index = Self::new(prefix_len);
        for (id, name) in entries {
            index.insert(id, name);
        }
        index
    }

    /// Register an item.
    pub fn insert(&mut self, id: ItemId, name: &str) {
        self.buckets
            .entry(prefix(name, self.prefix_len).to_string())
            .or_default()
            .push(id);
    }

    /// Unregister an item.
    pub fn remove(&mut self, id: ItemId, name: &str) {
        let key = prefix(name, self.prefix_len);
        if let Some(bucket) = self.buckets.get_mut(key) {
            bucket.retain(|x| *x != id);
            if bucket.is_empty() {
                self.buckets.remove(key);
            }
        }
    }

    /// Items whose name shares `name`'s prefix.
    pub fn bucket(&self, name: &str) -> &[ItemId] {
        self.buckets
            .get(prefix(name, self.prefix_len))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Lazily-built name indexes, one per item type.
///
/// Lookups take the read lock; a missing index is built under the write
/// lock so concurrent readers never build it twice. Mutations of the owning
/// index go through `&mut self` and keep built indexes current.
#[derive(Debug)]
pub struct NameCache {
    prefix_len: usize,
    slow_build: Duration,
    by_type: RwLock<HashMap<ItemType, NameIndex>>,
}

impl NameCache {
    /// Create an empty cache.
    pub fn new(prefix_len: usize, slow_build: Duration) -> Self {
        Self {
            prefix_len,
            slow_build,
            by_type: RwLock::new(HashMap::new()),
        }
    }

    /// Candidate IDs for `(item_type, name)`, building the type's index from
    /// `source` on first use.
    pub fn lookup<'a, F, I>(&self, item_type: ItemType, name: &str, source: F) -> Vec<ItemId>
    where
        F: FnOnce() -> I,
        I: IntoIterator<Item = (ItemId, &'a str)>,
    {
        {
            let guard = self.by_type.read();
            if let Some(index) = guard.get(&item_type) {
                return index.bucket(name).to_vec();
            }
        }

        let mut guard = self.by_type.write();
        let index = guard.entry(item_type).or_insert_with(|| {
            let start = Instant::now();
            let index = NameIndex::build(self.prefix_len, source());
            let elapsed = start.elapsed();
            if elapsed > self.slow_build {
                tracing::warn!(
                    item_type = %item_type,
                    items = index.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Slow name index build"
                );
            } else {
                tracing::debug!(
                    item_type = %item_type,
                    items = index.len(),
                    elapsed_us = elapsed.as_micros() as u64,
                    "Built name index"
                );
            }
            index
        });
        index.bucket(name).to_vec()
    }

    /// Whether the index for `item_type` has been built.
    pub fn is_built(&self, item_type: ItemType) -> bool {
        self.by_type.read().contains_key(&item_type)
    }

    /// Register a new item in its type's index, if built.
    pub fn insert(&mut self, item_type: ItemType, id: ItemId, name: &str) {
        if let Some(index) = self.by_type.get_mut().get_mut(&item_type) {
            index.insert(id, name);
        }
    }

    /// Unregister an item from its type's index, if built.
    pub fn remove(&mut self, item_type: ItemType, id: ItemId, name: &str) {
        if let Some(index) = self.by_type.get_mut().get_mut(&item_type) {
            index.remove(id, name);
        }
    }

    /// Drop every built index.
    pub fn invalidate(&mut self) {
        self.by_type.get_mut().clear();
    }
}
