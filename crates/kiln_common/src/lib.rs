//! Shared foundational types used across the Kiln artifact cache.
//!
//! This crate provides the content hash used to identify assets and the
//! deterministic key digest used to build namespaced cache keys.

#![warn(missing_docs)]

pub mod digest;
mod finite;
pub mod hash;

pub use digest::{digest_key, DIGEST_VERSION};
pub use hash::{ContentHash, ParseHashError};
