//! Logical path helpers and root-relative path encoding.

use std::path::{Path, PathBuf};

use crate::error::AssetError;

/// Placeholder that stands in for the asset root inside serialized records.
pub const ROOT_PLACEHOLDER: &str = "$root";

/// Checks that `logical_path` ends in a non-empty extension.
pub(crate) fn validate_logical_path(logical_path: &str) -> Result<(), AssetError> {
    let has_ext = Path::new(logical_path)
        .extension()
        .is_some_and(|ext| !ext.is_empty());
    if has_ext {
        Ok(())
    } else {
        Err(AssetError::InvalidArgument {
            reason: format!("logical path '{logical_path}' has no extension"),
        })
    }
}

/// Inserts `-<digest>` before the final extension of `logical_path`.
///
/// `app/app.js` with `deadbeef` becomes `app/app-deadbeef.js`; only the last
/// extension segment moves, so `a/b.min.js` becomes `a/b.min-<digest>.js`. A
/// path with no extension gets the digest appended.
pub fn splice_digest(logical_path: &str, digest: &str) -> String {
    let name_start = logical_path.rfind('/').map_or(0, |i| i + 1);
    match logical_path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let split = name_start + dot;
            format!(
                "{}-{}{}",
                &logical_path[..split],
                digest,
                &logical_path[split..]
            )
        }
        _ => format!("{logical_path}-{digest}"),
    }
}

/// Encodes `path` with the `root` prefix replaced by [`ROOT_PLACEHOLDER`].
///
/// Paths outside `root` are kept verbatim. Separators are normalized to `/`.
pub fn relativize(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => {
            let parts: Vec<_> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            if parts.is_empty() {
                ROOT_PLACEHOLDER.to_string()
            } else {
                format!("{ROOT_PLACEHOLDER}/{}", parts.join("/"))
            }
        }
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

/// Inverse of [`relativize`]: resolves a placeholder against `root`.
pub(crate) fn expand(root: &Path, encoded: &str) -> PathBuf {
    if encoded == ROOT_PLACEHOLDER {
        return root.to_path_buf();
    }
    match encoded.strip_prefix(ROOT_PLACEHOLDER).and_then(|r| r.strip_prefix('/')) {
        Some(rest) => root.join(rest),
        None => PathBuf::from(encoded),
    }
}
