//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// The façade never swallows these: a failing store surfaces its error to the
/// caller of `fetch`, `get_raw`, or `set_raw`. Only the reference file store
/// downgrades unreadable entries to misses.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A key or value could not be encoded.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// A key cannot be mapped onto the store's namespace.
    #[error("invalid cache key '{key}'")]
    InvalidKey {
        /// The offending key.
        key: String,
    },

    /// An external store raised an error from `get` or `set`.
    #[error("cache backend error: {source}")]
    Backend {
        /// The error reported by the store.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CacheError {
    /// Wraps an error raised by an external store.
    pub fn backend(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend {
            source: source.into(),
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
