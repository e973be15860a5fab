//! Namespaced fetch-or-compute caching over pluggable key/value stores.
//!
//! A store of any supported shape is wrapped once by a [`BackendAdapter`] and
//! driven through a [`Cache`], which expands structured keys into versioned
//! digest strings. [`MemoryStore`], [`FileStore`], and [`NullStore`] are
//! provided as ready-made stores.

#![warn(missing_docs)]

pub mod adapter;
pub mod cache;
pub mod error;
pub mod file_store;
pub mod memory;
pub mod store;

pub use adapter::{AdapterKind, BackendAdapter};
pub use cache::{Cache, CACHE_FORMAT_VERSION, CACHE_NAMESPACE, MAX_KEY_LEN};
pub use error::CacheError;
pub use file_store::FileStore;
pub use memory::{MemoryStore, DEFAULT_MAX_ENTRIES};
pub use store::{Backend, GetSetStore, IndexStore, NullStore, ReadWriteStore, Store};
