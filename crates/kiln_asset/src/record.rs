//! Conversion between assets and their portable serialized records.
//!
//! Records are string-keyed JSON objects tagged by `class`. Source and
//! dependency paths under the asset root are stored with a `$root`
//! placeholder so a record stays valid after the project moves.

use std::path::Path;

use kiln_common::ContentHash;
use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::asset::{Asset, AssetClass, Dependency, Derived, Variant};
use crate::error::AssetError;
use crate::path::{expand, relativize};

#[derive(Debug, Deserialize)]
struct AssetRecord {
    class: String,
    logical_path: String,
    #[serde(default)]
    pathname: Option<String>,
    content_type: String,
    #[serde(default)]
    mtime: Option<i64>,
    #[serde(default, deserialize_with = "coerce_length")]
    length: Option<u64>,
    digest: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    dependency_paths: Vec<DependencyRecord>,
    #[serde(default)]
    required_paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DependencyRecord {
    path: String,
    #[serde(default)]
    mtime: Option<i64>,
    digest: String,
}

/// Accepts a length as an integer or a decimal string.
fn coerce_length<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("length {n} is not a byte count"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("length '{s}' is not a byte count"))),
        Some(other) => Err(D::Error::custom(format!(
            "length {other} is not a byte count"
        ))),
    }
}

fn parse_digest(hex: &str) -> Result<ContentHash, AssetError> {
    ContentHash::from_hex(hex).map_err(|e| AssetError::unserialize(format!("digest: {e}")))
}

impl Asset {
    /// Serializes this asset into a portable record.
    pub fn to_record(&self) -> Value {
        let mut map = Map::new();
        map.insert("class".into(), self.class().tag().into());
        map.insert("logical_path".into(), self.logical_path.clone().into());
        if let Some(path) = &self.source_path {
            map.insert("pathname".into(), relativize(&self.root, path).into());
        }
        map.insert("content_type".into(), self.content_type.clone().into());
        if let Some(mtime) = self.mtime {
            map.insert("mtime".into(), mtime.into());
        }
        if let Some(length) = self.length {
            map.insert("length".into(), length.into());
        }
        map.insert("digest".into(), self.digest.to_hex().into());

        match &self.variant {
            Variant::Asset | Variant::Static => {}
            Variant::Processed(derived) => self.insert_derived(&mut map, derived),
            Variant::Bundled {
                derived,
                required_paths,
            } => {
                self.insert_derived(&mut map, derived);
                map.insert("required_paths".into(), required_paths.clone().into());
            }
        }
        Value::Object(map)
    }

    fn insert_derived(&self, map: &mut Map<String, Value>, derived: &Derived) {
        map.insert("source".into(), derived.source.clone().into());
        let deps = derived
            .dependencies
            .iter()
            .map(|dep| {
                let mut entry = Map::new();
                entry.insert("path".into(), relativize(&self.root, &dep.path).into());
                if let Some(mtime) = dep.mtime {
                    entry.insert("mtime".into(), mtime.into());
                }
                entry.insert("digest".into(), dep.digest.to_hex().into());
                Value::Object(entry)
            })
            .collect();
        map.insert("dependency_paths".into(), Value::Array(deps));
    }

    /// Reconstructs an asset from a record produced by [`Asset::to_record`].
    ///
    /// Does not touch the filesystem; `$root` placeholders resolve against
    /// `root`. Fails with [`AssetError::Unserialize`] on an unknown tag, a
    /// missing required field, or a length that cannot be coerced.
    pub fn from_record(root: impl AsRef<Path>, record: &Value) -> Result<Self, AssetError> {
        let root = root.as_ref();
        let raw = AssetRecord::deserialize(record)
            .map_err(|e| AssetError::unserialize(e.to_string()))?;
        let class = AssetClass::from_tag(&raw.class)
            .ok_or_else(|| AssetError::unserialize(format!("unknown class '{}'", raw.class)))?;

        let variant = match class {
            AssetClass::Asset => Variant::Asset,
            AssetClass::Static => Variant::Static,
            AssetClass::Processed => Variant::Processed(derived_from(root, &raw)?),
            AssetClass::Bundled => Variant::Bundled {
                derived: derived_from(root, &raw)?,
                required_paths: raw.required_paths.clone(),
            },
        };

        Ok(Self {
            root: root.to_path_buf(),
            source_path: raw.pathname.as_deref().map(|p| expand(root, p)),
            digest: parse_digest(&raw.digest)?,
            logical_path: raw.logical_path,
            content_type: raw.content_type,
            mtime: raw.mtime,
            length: raw.length,
            variant,
        })
    }

    /// Like [`Asset::from_record`], but treats a malformed record as absent.
    pub fn try_from_record(root: impl AsRef<Path>, record: &Value) -> Option<Self> {
        match Self::from_record(root, record) {
            Ok(asset) => Some(asset),
            Err(e) => {
                tracing::debug!(error = %e, "discarding unreadable asset record");
                None
            }
        }
    }
}

fn derived_from(root: &Path, raw: &AssetRecord) -> Result<Derived, AssetError> {
    let source = raw.source.clone().ok_or_else(|| {
        AssetError::unserialize(format!("{} record has no 'source'", raw.class))
    })?;
    let dependencies = raw
        .dependency_paths
        .iter()
        .map(|dep| -> Result<Dependency, AssetError> {
            Ok(Dependency {
                path: expand(root, &dep.path),
                mtime: dep.mtime,
                digest: parse_digest(&dep.digest)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Derived {
        source,
        dependencies,
    })
}
