//! Error types for asset construction, reconstruction, and writing.

use std::path::PathBuf;

use kiln_cache::CacheError;

/// Errors that can occur while building, reconstructing, or writing an asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Construction input is malformed, e.g. a logical path without an extension.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the problem.
        reason: String,
    },

    /// A serialized record is malformed or belongs to an unknown variant.
    ///
    /// Callers reading records from a cache should treat this as a miss.
    #[error("cannot unserialize asset record: {reason}")]
    Unserialize {
        /// Description of the problem.
        reason: String,
    },

    /// A filesystem operation failed.
    #[error("asset I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The asset's body lives on disk but its source path is unknown.
    #[error("source path of '{logical_path}' is unknown")]
    MissingSource {
        /// Logical path of the asset.
        logical_path: String,
    },

    /// The source file changed after the asset was built, so its bytes no
    /// longer match the recorded digest.
    #[error("'{logical_path}' changed on disk since it was built")]
    Stale {
        /// Logical path of the asset.
        logical_path: String,
    },

    /// The backing cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unserialize(reason: impl Into<String>) -> Self {
        Self::Unserialize {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_display() {
        let err = AssetError::InvalidArgument {
            reason: "logical path 'README' has no extension".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid argument: logical path 'README' has no extension"
        );
    }

    #[test]
    fn unserialize_display() {
        let err = AssetError::unserialize("unknown class 'Widget'");
        assert!(err.to_string().contains("unknown class 'Widget'"));
    }

    #[test]
    fn io_display() {
        let err = AssetError::io(
            "app/app.js",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("asset I/O error"));
        assert!(msg.contains("app/app.js"));
    }

    #[test]
    fn cache_error_is_transparent() {
        let err: AssetError = CacheError::backend("down").into();
        assert_eq!(err.to_string(), "cache backend error: down");
    }
}
