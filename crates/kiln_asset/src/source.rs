//! Source file hashing and stat helpers.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use kiln_common::ContentHash;

use crate::error::AssetError;

/// Size and whole-second modification time of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStat {
    /// File length in bytes.
    pub len: u64,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: i64,
}

/// Utility for hashing and inspecting asset source files.
pub struct SourceHasher;

impl SourceHasher {
    /// Computes the content hash of a file, streaming its bytes.
    pub fn hash_file(path: &Path) -> Result<ContentHash, AssetError> {
        let file = File::open(path).map_err(|e| AssetError::io(path, e))?;
        ContentHash::from_reader(BufReader::new(file)).map_err(|e| AssetError::io(path, e))
    }

    /// Reads the length and modification time of a file.
    pub fn stat(path: &Path) -> Result<SourceStat, AssetError> {
        let meta = std::fs::metadata(path).map_err(|e| AssetError::io(path, e))?;
        let modified = meta.modified().map_err(|e| AssetError::io(path, e))?;
        Ok(SourceStat {
            len: meta.len(),
            mtime: unix_seconds(modified),
        })
    }
}

/// Truncates a timestamp to whole seconds since the Unix epoch.
///
/// Times before the epoch round toward negative infinity.
pub fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => {
            let d = e.duration();
            let secs = i64::try_from(d.as_secs()).unwrap_or(i64::MAX);
            if d.subsec_nanos() > 0 {
                -secs - 1
            } else {
                -secs
            }
        }
    }
}
