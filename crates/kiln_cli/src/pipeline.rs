//! Shared helpers for CLI commands.
//!
//! Resolves the project directory and its `kiln.toml`, opens the configured
//! cache store, and classifies source files by extension.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_asset::{load_cached, relativize, Asset};
use kiln_cache::{Cache, FileStore, MemoryStore};
use kiln_config::{KilnConfig, StoreKind, CONFIG_FILE_NAME};
use serde_json::json;

use crate::GlobalArgs;

/// A loaded project: its directory and validated configuration.
pub struct Project {
    /// Directory containing `kiln.toml`, or the working directory if none.
    pub dir: PathBuf,
    /// The parsed configuration.
    pub config: KilnConfig,
}

impl Project {
    /// Returns the asset root.
    pub fn asset_root(&self) -> PathBuf {
        self.dir.join(&self.config.assets.root)
    }

    /// Returns the directory written assets land in.
    pub fn output_dir(&self) -> PathBuf {
        self.dir.join(&self.config.assets.output)
    }
}

/// Walks up from `start` looking for the nearest directory containing `kiln.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).exists() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Resolves the project from global CLI args.
///
/// If `--config` is specified, loads that file and uses its parent as the
/// project directory. Otherwise walks up from the current directory looking
/// for `kiln.toml`, falling back to defaults in the current directory.
pub fn resolve_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    resolve_project_from(global, &std::env::current_dir()?)
}

/// Resolves the project as [`resolve_project`] would when run from `cwd`.
///
/// The project directory is always absolute, so records relativize sources
/// against the real asset root.
fn resolve_project_from(
    global: &GlobalArgs,
    cwd: &Path,
) -> Result<Project, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let path = cwd.join(config_path);
        let config = kiln_config::load_config_file(&path)?;
        let dir = path
            .parent()
            .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
        return Ok(Project { dir, config });
    }

    match find_project_root(cwd) {
        Some(dir) => {
            let config = kiln_config::load_config(&dir)?;
            Ok(Project { dir, config })
        }
        None => {
            tracing::debug!(dir = %cwd.display(), "no {CONFIG_FILE_NAME} found, using defaults");
            Ok(Project {
                dir: cwd.to_path_buf(),
                config: KilnConfig::default(),
            })
        }
    }
}

/// Opens the cache store selected by the project configuration.
pub fn open_cache(project: &Project) -> Cache {
    let cache = &project.config.cache;
    match cache.store {
        StoreKind::Memory => {
            let capacity = NonZeroUsize::new(cache.max_entries).unwrap_or(NonZeroUsize::MIN);
            Cache::new(Arc::new(MemoryStore::with_capacity(capacity)))
        }
        StoreKind::File => {
            let root = project.dir.join(&cache.path);
            let store = match cache.max_size {
                Some(max_size) => FileStore::with_max_size(root, max_size),
                None => FileStore::new(root),
            };
            Cache::new(Arc::new(store))
        }
        StoreKind::Null => Cache::null(),
    }
}

/// Derives a content type from a file extension.
pub fn content_type_for(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mime = match ext.as_deref() {
        Some("js" | "mjs") => "application/javascript",
        Some("css") => "text/css",
        Some("html" | "htm") => "text/html",
        Some("json" | "map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/vnd.microsoft.icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

/// Builds the asset for `source`, or loads it through the project's cache.
pub fn load_asset(
    project: &Project,
    logical_path: &str,
    source: &Path,
) -> Result<Asset, Box<dyn std::error::Error>> {
    let root = project.asset_root();
    let source = if source.is_absolute() {
        source.to_path_buf()
    } else {
        std::env::current_dir()?.join(source)
    };
    let key = asset_key(&root, logical_path, &source);
    let cache = open_cache(project);
    let asset = load_cached(&cache, &root, &key, || {
        Asset::from_source(&root, logical_path, &source, &content_type_for)
    })?;
    Ok(asset)
}

/// Cache key for an asset, independent of where the project lives.
fn asset_key(root: &Path, logical_path: &str, source: &Path) -> serde_json::Value {
    json!({
        "logical_path": logical_path,
        "source": relativize(root, source),
    })
}
