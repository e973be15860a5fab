//! Normalizes heterogeneous stores onto the uniform [`Backend`] contract.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::CacheError;
use crate::store::{Backend, GetSetStore, IndexStore, NullStore, ReadWriteStore, Store};

/// Which store shape an adapter routes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// The store implements [`Backend`] itself.
    Direct,
    /// Native `get`/`set` (also used for the no-op fallback).
    GetSet,
    /// Map-like `index_get`/`index_set`.
    Index,
    /// `read`/`write`.
    ReadWrite,
}

/// A store wrapped behind the two-operation cache contract.
///
/// The variant is chosen once by [`BackendAdapter::wrap`]; calls dispatch
/// straight to the captured capability without probing again.
#[derive(Clone)]
pub enum BackendAdapter {
    /// Pass-through to a store that already implements [`Backend`].
    Direct(Arc<dyn Backend>),
    /// Adapts a native get/set store 1:1.
    GetSet(Arc<dyn GetSetStore>),
    /// Adapts key indexing to get/set.
    Index(Arc<dyn IndexStore>),
    /// Adapts read to get and write to set.
    ReadWrite(Arc<dyn ReadWriteStore>),
}

impl BackendAdapter {
    /// Wraps `store`, probing its capabilities in priority order.
    ///
    /// More cache-shaped interfaces win over generic ones: the uniform
    /// contract, then native get/set, then indexing, then read/write. A store
    /// with none of these is replaced by a [`NullStore`], so this never fails.
    pub fn wrap(store: Arc<dyn Store>) -> Self {
        let adapter = if let Some(backend) = Arc::clone(&store).as_backend() {
            Self::Direct(backend)
        } else if let Some(get_set) = Arc::clone(&store).as_get_set() {
            Self::GetSet(get_set)
        } else if let Some(index) = Arc::clone(&store).as_index() {
            Self::Index(index)
        } else if let Some(read_write) = store.as_read_write() {
            Self::ReadWrite(read_write)
        } else {
            tracing::debug!("store supports no cache shape; falling back to null store");
            Self::null()
        };
        tracing::trace!(kind = ?adapter.kind(), "wrapped cache store");
        adapter
    }

    /// An adapter over the no-op store.
    pub fn null() -> Self {
        Self::GetSet(Arc::new(NullStore))
    }

    /// Returns the shape this adapter routes through.
    pub fn kind(&self) -> AdapterKind {
        match self {
            Self::Direct(_) => AdapterKind::Direct,
            Self::GetSet(_) => AdapterKind::GetSet,
            Self::Index(_) => AdapterKind::Index,
            Self::ReadWrite(_) => AdapterKind::ReadWrite,
        }
    }
}

impl Backend for BackendAdapter {
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        match self {
            Self::Direct(store) => store.get(key),
            Self::GetSet(store) => store.get(key),
            Self::Index(store) => Ok(store.index_get(key)),
            Self::ReadWrite(store) => store.read(key),
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<Value, CacheError> {
        match self {
            Self::Direct(store) => store.set(key, value),
            Self::GetSet(store) => {
                store.set(key, value.clone())?;
                Ok(value)
            }
            Self::Index(store) => {
                store.index_set(key, value.clone());
                Ok(value)
            }
            Self::ReadWrite(store) => {
                store.write(key, value.clone())?;
                Ok(value)
            }
        }
    }
}

impl fmt::Debug for BackendAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackendAdapter({:?})", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Implements every shape so priority order is observable.
    #[derive(Default)]
    struct Everything {
        calls: Mutex<Vec<&'static str>>,
    }

    impl Everything {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl Backend for Everything {
        fn get(&self, _key: &str) -> Result<Option<Value>, CacheError> {
            self.record("backend.get");
            Ok(None)
        }
        fn set(&self, _key: &str, value: Value) -> Result<Value, CacheError> {
            self.record("backend.set");
            Ok(value)
        }
    }

    impl GetSetStore for Everything {
        fn get(&self, _key: &str) -> Result<Option<Value>, CacheError> {
            self.record("get");
            Ok(None)
        }
        fn set(&self, _key: &str, _value: Value) -> Result<(), CacheError> {
            self.record("set");
            Ok(())
        }
    }

    impl IndexStore for Everything {
        fn index_get(&self, _key: &str) -> Option<Value> {
            self.record("index_get");
            None
        }
        fn index_set(&self, _key: &str, _value: Value) {
            self.record("index_set");
        }
    }

    impl Store for Everything {
        fn as_backend(self: Arc<Self>) -> Option<Arc<dyn Backend>> {
            Some(self)
        }
        fn as_get_set(self: Arc<Self>) -> Option<Arc<dyn GetSetStore>> {
            Some(self)
        }
        fn as_index(self: Arc<Self>) -> Option<Arc<dyn IndexStore>> {
            Some(self)
        }
    }

    /// Index and read/write: indexing must win.
    #[derive(Default)]
    struct MapLike {
        map: Mutex<HashMap<String, Value>>,
    }

    impl IndexStore for MapLike {
        fn index_get(&self, key: &str) -> Option<Value> {
            self.map.lock().unwrap().get(key).cloned()
        }
        fn index_set(&self, key: &str, value: Value) {
            self.map.lock().unwrap().insert(key.to_string(), value);
        }
    }

    impl ReadWriteStore for MapLike {
        fn read(&self, _key: &str) -> Result<Option<Value>, CacheError> {
            panic!("read/write must not be chosen over indexing");
        }
        fn write(&self, _key: &str, _value: Value) -> Result<(), CacheError> {
            panic!("read/write must not be chosen over indexing");
        }
    }

    impl Store for MapLike {
        fn as_index(self: Arc<Self>) -> Option<Arc<dyn IndexStore>> {
            Some(self)
        }
        fn as_read_write(self: Arc<Self>) -> Option<Arc<dyn ReadWriteStore>> {
            Some(self)
        }
    }

    struct Opaque;
    impl Store for Opaque {}

    #[test]
    fn direct_contract_wins() {
        let store = Arc::new(Everything::default());
        let adapter = BackendAdapter::wrap(store.clone());
        assert_eq!(adapter.kind(), AdapterKind::Direct);

        adapter.get("k").unwrap();
        adapter.set("k", Value::from(1)).unwrap();
        assert_eq!(*store.calls.lock().unwrap(), vec!["backend.get", "backend.set"]);
    }

    #[test]
    fn index_preferred_over_read_write() {
        let adapter = BackendAdapter::wrap(Arc::new(MapLike::default()));
        assert_eq!(adapter.kind(), AdapterKind::Index);

        let stored = adapter.set("k", Value::from("v")).unwrap();
        assert_eq!(stored, Value::from("v"));
        assert_eq!(adapter.get("k").unwrap(), Some(Value::from("v")));
    }

    #[test]
    fn unrecognized_store_falls_back_to_null() {
        let adapter = BackendAdapter::wrap(Arc::new(Opaque));
        assert_eq!(adapter.kind(), AdapterKind::GetSet);

        let stored = adapter.set("k", Value::from(42)).unwrap();
        assert_eq!(stored, Value::from(42));
        assert!(adapter.get("k").unwrap().is_none());
    }

    #[test]
    fn debug_names_kind() {
        let adapter = BackendAdapter::null();
        assert_eq!(format!("{adapter:?}"), "BackendAdapter(GetSet)");
    }
}
