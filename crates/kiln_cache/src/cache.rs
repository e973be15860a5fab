//! Namespaced fetch-or-compute façade over a wrapped store.
//!
//! Every key handed to [`Cache`] is expanded to
//! `<namespace>/v<format version>/<digest>` before it reaches the store. The
//! format version is the only invalidation mechanism: bumping it moves every
//! new entry under a fresh prefix and silently orphans the old ones.

use std::sync::Arc;
use std::time::Instant;

use kiln_common::digest_key;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::adapter::{AdapterKind, BackendAdapter};
use crate::error::CacheError;
use crate::store::{Backend, Store};

/// Namespace prefix shared by every expanded key.
pub const CACHE_NAMESPACE: &str = "kiln";

/// Cache format version. Increment on breaking changes to what gets stored.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Upper bound on expanded key length, for size-constrained stores.
pub const MAX_KEY_LEN: usize = 250;

/// Fetch-or-compute cache over any supported store.
///
/// Cloning is cheap and clones share the underlying store. `fetch` is not
/// atomic: two callers missing on the same key may both compute, and the last
/// write wins. Callers must therefore only cache idempotent computations, and
/// must never store a semantically different value under a key that was
/// already written.
#[derive(Clone, Debug)]
pub struct Cache {
    backend: BackendAdapter,
}

impl Cache {
    /// Creates a cache over `store`, choosing the adapter once.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            backend: BackendAdapter::wrap(store),
        }
    }

    /// Creates a cache that never retains anything.
    pub fn null() -> Self {
        Self {
            backend: BackendAdapter::null(),
        }
    }

    /// Returns the store shape this cache routes through.
    pub fn adapter_kind(&self) -> AdapterKind {
        self.backend.kind()
    }

    /// Expands a structured key into the string handed to the store.
    pub fn expand_key<K: Serialize + ?Sized>(key: &K) -> Result<String, CacheError> {
        let digest = digest_key(key)?;
        Ok(format!("{CACHE_NAMESPACE}/v{CACHE_FORMAT_VERSION}/{digest}"))
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    ///
    /// `compute` runs at most once per call and never on a hit. Store errors
    /// propagate unchanged.
    pub fn fetch<K, F, E>(&self, key: &K, compute: F) -> Result<Value, E>
    where
        K: Serialize + ?Sized,
        F: FnOnce() -> Result<Value, E>,
        E: From<CacheError>,
    {
        let expanded = Self::expand_key(key)?;
        if let Some(value) = self.backend.get(&expanded)? {
            return Ok(value);
        }

        let start = Instant::now();
        let value = compute()?;
        tracing::debug!(
            key = %expanded,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "cache miss"
        );
        Ok(self.backend.set(&expanded, value)?)
    }

    /// Typed variant of [`fetch`](Self::fetch).
    ///
    /// A hit that no longer decodes as `T` is treated as a miss and
    /// overwritten with the freshly computed value.
    pub fn fetch_as<K, T, F, E>(&self, key: &K, compute: F) -> Result<T, E>
    where
        K: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, E>,
        E: From<CacheError>,
    {
        let expanded = Self::expand_key(key)?;
        if let Some(value) = self.backend.get(&expanded)? {
            match serde_json::from_value(value) {
                Ok(hit) => return Ok(hit),
                Err(e) => {
                    tracing::debug!(key = %expanded, error = %e, "discarding undecodable cache entry")
                }
            }
        }

        let start = Instant::now();
        let computed = compute()?;
        tracing::debug!(
            key = %expanded,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "cache miss"
        );
        let value = serde_json::to_value(&computed).map_err(CacheError::from)?;
        self.backend.set(&expanded, value)?;
        Ok(computed)
    }

    /// Looks up `key` without computing anything.
    pub fn get_raw<K: Serialize + ?Sized>(&self, key: &K) -> Result<Option<Value>, CacheError> {
        self.backend.get(&Self::expand_key(key)?)
    }

    /// Stores `value` under `key`, returning it.
    pub fn set_raw<K: Serialize + ?Sized>(&self, key: &K, value: Value) -> Result<Value, CacheError> {
        self.backend.set(&Self::expand_key(key)?, value)
    }
}
