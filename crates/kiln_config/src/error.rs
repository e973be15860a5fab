//! Errors raised while loading `kiln.toml`.

use std::path::PathBuf;

/// Why a `kiln.toml` configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    IoError {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The content is not TOML, or names a section, key, or value kiln does
    /// not know.
    #[error("{origin} is not a valid kiln.toml: {reason}")]
    ParseError {
        /// The file path, or `<inline>` for configuration parsed from a string.
        origin: String,
        /// The parser's description of the problem.
        reason: String,
    },

    /// A well-formed value is outside its usable range.
    #[error("invalid {key}: {reason}")]
    ValidationError {
        /// Dotted key of the offending value, e.g. `cache.max_entries`.
        key: &'static str,
        /// What the value must satisfy.
        reason: &'static str,
    },
}
