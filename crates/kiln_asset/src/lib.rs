//! Immutable, content-addressed build artifacts.
//!
//! An [`Asset`] records where an artifact came from and the digest of its
//! realized body. Assets serialize to portable records for caching, check
//! their own freshness against the files on disk, and write themselves out
//! atomically, optionally gzipped.

#![warn(missing_docs)]

pub mod asset;
pub mod cached;
pub mod error;
pub mod path;
pub mod record;
pub mod source;
pub mod write;

pub use asset::{Asset, AssetClass, ContentClassifier, Dependency};
pub use cached::load_cached;
pub use error::AssetError;
pub use path::{relativize, splice_digest, ROOT_PLACEHOLDER};
pub use source::{unix_seconds, SourceHasher, SourceStat};
pub use write::WriteOptions;
