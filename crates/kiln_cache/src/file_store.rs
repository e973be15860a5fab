//! On-disk store keeping one JSON file per expanded key.
//!
//! An expanded key `kiln/v1/<digest>` lives at
//! `<root>/kiln/v1/<digest>.cache`, so bumping the format version moves new
//! entries into a sibling directory. Reads are fail-safe: a missing, unreadable,
//! or corrupt entry is a miss. Writes go through a temporary file in the
//! destination directory that is renamed into place.

use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use serde_json::Value;

use crate::error::CacheError;
use crate::store::{GetSetStore, Store};

/// File extension for cache entries.
const ENTRY_EXT: &str = "cache";

/// Compaction target, as a fraction of `max_size` (numerator / denominator).
const COMPACT_TO: (u64, u64) = (3, 4);

/// Persistent store rooted at a directory.
pub struct FileStore {
    /// Root directory for all entries.
    root: PathBuf,

    /// Size limit in bytes; `None` means unbounded.
    max_size: Option<u64>,

    /// Last known total entry size. Measured lazily on the first bounded write.
    usage: Mutex<Option<u64>>,
}

/// One entry file seen during a directory scan.
struct EntryFile {
    path: PathBuf,
    len: u64,
    modified: SystemTime,
}

impl FileStore {
    /// Creates an unbounded store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_size: None,
            usage: Mutex::new(None),
        }
    }

    /// Creates a store that compacts itself once entries exceed `max_size` bytes.
    pub fn with_max_size(root: impl Into<PathBuf>, max_size: u64) -> Self {
        Self {
            max_size: Some(max_size),
            ..Self::new(root)
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file path for an entry, rejecting keys that would escape
    /// the root directory.
    pub fn entry_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        let rel = Path::new(key);
        let escapes = key.is_empty()
            || rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(CacheError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(format!("{key}.{ENTRY_EXT}")))
    }

    /// Removes the least recently written entries until usage is at most
    /// three quarters of `max_size`. Returns the number of files removed.
    ///
    /// Does nothing for an unbounded store.
    pub fn gc(&self) -> Result<usize, CacheError> {
        let Some(max_size) = self.max_size else {
            return Ok(0);
        };
        let mut usage = self.usage.lock().unwrap_or_else(PoisonError::into_inner);
        let (removed, remaining) = self.compact(max_size)?;
        *usage = Some(remaining);
        Ok(removed)
    }

    fn compact(&self, max_size: u64) -> Result<(usize, u64), CacheError> {
        let mut entries = self.scan()?;
        let mut total: u64 = entries.iter().map(|e| e.len).sum();
        let target = max_size / COMPACT_TO.1 * COMPACT_TO.0;
        if total <= target {
            return Ok((0, total));
        }

        entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
        let mut removed = 0;
        for entry in entries {
            if total <= target {
                break;
            }
            match std::fs::remove_file(&entry.path) {
                Ok(()) => {}
                // Another process got there first.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CacheError::Io {
                        path: entry.path,
                        source: e,
                    })
                }
            }
            total = total.saturating_sub(entry.len);
            removed += 1;
        }
        tracing::debug!(
            root = %self.root.display(),
            removed,
            remaining_bytes = total,
            "compacted file cache"
        );
        Ok((removed, total))
    }

    fn scan(&self) -> Result<Vec<EntryFile>, CacheError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for item in walkdir::WalkDir::new(&self.root) {
            let item = item.map_err(|e| {
                let path = e.path().map_or_else(|| self.root.clone(), Path::to_path_buf);
                CacheError::Io {
                    path,
                    source: e.into(),
                }
            })?;
            let path = item.path();
            if !item.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT)
            {
                continue;
            }
            let meta = item.metadata().map_err(|e| CacheError::Io {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
            entries.push(EntryFile {
                path: path.to_path_buf(),
                len: meta.len(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        Ok(entries)
    }

    fn account_write(&self, added: u64, replaced: u64) -> Result<(), CacheError> {
        let Some(max_size) = self.max_size else {
            return Ok(());
        };
        let mut usage = self.usage.lock().unwrap_or_else(PoisonError::into_inner);
        let current = match *usage {
            Some(bytes) => bytes.saturating_sub(replaced) + added,
            // The fresh scan already sees the file just written.
            None => self.scan()?.iter().map(|e| e.len).sum(),
        };
        *usage = if current > max_size {
            Some(self.compact(max_size)?.1)
        } else {
            Some(current)
        };
        Ok(())
    }
}

impl GetSetStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let path = self.entry_path(key)?;
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "unreadable cache entry");
                return Ok(None);
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "corrupt cache entry");
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<(), CacheError> {
        let path = self.entry_path(key)?;
        let parent = path.parent().unwrap_or(&self.root).to_path_buf();
        std::fs::create_dir_all(&parent).map_err(|e| CacheError::Io {
            path: parent.clone(),
            source: e,
        })?;

        let bytes = serde_json::to_vec(&value)?;
        let replaced = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| CacheError::Io {
            path: parent.clone(),
            source: e,
        })?;
        tmp.write_all(&bytes).map_err(|e| CacheError::Io {
            path: tmp.path().to_path_buf(),
            source: e,
        })?;
        tmp.persist(&path).map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e.error,
        })?;

        self.account_write(bytes.len() as u64, replaced)
    }
}

impl Store for FileStore {
    fn as_get_set(self: Arc<Self>) -> Option<Arc<dyn GetSetStore>> {
        Some(self)
    }
}
