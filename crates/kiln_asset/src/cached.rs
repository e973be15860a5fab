//! Cache-backed asset loading with freshness checks.

use std::path::Path;
use std::time::Instant;

use kiln_cache::Cache;
use serde::Serialize;

use crate::asset::Asset;
use crate::error::AssetError;

/// Loads an asset through `cache`, rebuilding it when needed.
///
/// A cached record is reused only if it reconstructs cleanly and is still
/// fresh against the files on disk. A missing, malformed, or stale record
/// runs `build` and stores the new asset's record under `key`.
pub fn load_cached<K, F>(
    cache: &Cache,
    root: &Path,
    key: &K,
    build: F,
) -> Result<Asset, AssetError>
where
    K: Serialize + ?Sized,
    F: FnOnce() -> Result<Asset, AssetError>,
{
    if let Some(record) = cache.get_raw(key)? {
        match Asset::try_from_record(root, &record) {
            Some(asset) if asset.is_fresh() => return Ok(asset),
            Some(asset) => {
                tracing::debug!(logical_path = %asset.logical_path(), "cached asset is stale");
            }
            None => {}
        }
    }

    let start = Instant::now();
    let asset = build()?;
    cache.set_raw(key, asset.to_record())?;
    tracing::debug!(
        logical_path = %asset.logical_path(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "built asset"
    );
    Ok(asset)
}
