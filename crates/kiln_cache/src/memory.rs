//! Bounded in-process store.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use serde_json::Value;

use crate::store::{IndexStore, Store};

/// Default number of entries a [`MemoryStore`] retains.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Thread-safe LRU map of expanded keys to values.
///
/// Exposed to the cache as a map-like store. Once full, each insert evicts
/// the least recently used entry.
pub struct MemoryStore {
    entries: Mutex<LruCache<String, Value>>,
}

impl MemoryStore {
    /// Creates a store holding up to [`DEFAULT_MAX_ENTRIES`] entries.
    pub fn new() -> Self {
        Self::with_capacity(NonZeroUsize::new(DEFAULT_MAX_ENTRIES).unwrap_or(NonZeroUsize::MIN))
    }

    /// Creates a store holding up to `max_entries` entries.
    pub fn with_capacity(max_entries: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(max_entries)),
        }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexStore for MemoryStore {
    fn index_get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    fn index_set(&self, key: &str, value: Value) {
        self.lock().put(key.to_string(), value);
    }
}

impl Store for MemoryStore {
    fn as_index(self: Arc<Self>) -> Option<Arc<dyn IndexStore>> {
        Some(self)
    }
}
