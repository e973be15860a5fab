//! Capability traits for external key/value stores.
//!
//! Stores come in different shapes: some already speak the uniform
//! get/set contract, some offer a native `get`/`set` pair, some are map-like,
//! and some expose `read`/`write`. A store advertises which shapes it supports
//! by overriding the matching accessor on [`Store`]; the
//! [`BackendAdapter`](crate::adapter::BackendAdapter) probes them once.
//!
//! Every store must be safe for concurrent use. The cache imposes no locking of
//! its own.

use std::sync::Arc;

use serde_json::Value;

use crate::error::CacheError;

/// The uniform contract every adapter exposes.
///
/// `set` returns the stored value so callers can chain on it.
pub trait Backend: Send + Sync {
    /// Looks up `key`, returning `None` on a miss.
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Stores `value` under `key` and returns it.
    fn set(&self, key: &str, value: Value) -> Result<Value, CacheError>;
}

/// A store with a native retrieval/assignment pair, such as a memcache client.
pub trait GetSetStore: Send + Sync {
    /// Looks up `key`, returning `None` on a miss.
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Stores `value` under `key`.
    fn set(&self, key: &str, value: Value) -> Result<(), CacheError>;
}

/// A map-like store addressed by key lookup and key assignment.
pub trait IndexStore: Send + Sync {
    /// Returns the value at `key`, if any.
    fn index_get(&self, key: &str) -> Option<Value>;

    /// Assigns `value` to `key`.
    fn index_set(&self, key: &str, value: Value);
}

/// A store with separate `read` and `write` operations.
pub trait ReadWriteStore: Send + Sync {
    /// Reads the value at `key`, returning `None` on a miss.
    fn read(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Writes `value` to `key`.
    fn write(&self, key: &str, value: Value) -> Result<(), CacheError>;
}

/// Capability probe for a store.
///
/// Each accessor defaults to "unsupported". A store overrides the accessors for
/// the shapes it implements, typically with `Some(self)`:
///
/// ```ignore
/// impl Store for MyStore {
///     fn as_read_write(self: Arc<Self>) -> Option<Arc<dyn ReadWriteStore>> {
///         Some(self)
///     }
/// }
/// ```
pub trait Store: Send + Sync {
    /// Returns the store as a [`Backend`] if it implements the uniform contract.
    fn as_backend(self: Arc<Self>) -> Option<Arc<dyn Backend>> {
        None
    }

    /// Returns the store as a [`GetSetStore`] if it has native get/set.
    fn as_get_set(self: Arc<Self>) -> Option<Arc<dyn GetSetStore>> {
        None
    }

    /// Returns the store as an [`IndexStore`] if it is map-like.
    fn as_index(self: Arc<Self>) -> Option<Arc<dyn IndexStore>> {
        None
    }

    /// Returns the store as a [`ReadWriteStore`] if it has read/write.
    fn as_read_write(self: Arc<Self>) -> Option<Arc<dyn ReadWriteStore>> {
        None
    }
}

/// A store that never holds anything.
///
/// Every lookup misses and every write is discarded. It is the fallback for
/// stores that support no recognized shape, so cache operations degrade to
/// misses instead of failing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl GetSetStore for NullStore {
    fn get(&self, _key: &str) -> Result<Option<Value>, CacheError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: Value) -> Result<(), CacheError> {
        Ok(())
    }
}

impl Store for NullStore {
    fn as_get_set(self: Arc<Self>) -> Option<Arc<dyn GetSetStore>> {
        Some(self)
    }
}
