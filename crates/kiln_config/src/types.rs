//! Configuration types deserialized from `kiln.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// The top-level configuration parsed from `kiln.toml`.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KilnConfig {
    /// Cache store selection and limits.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Asset source and output locations.
    #[serde(default)]
    pub assets: AssetsConfig,
}

/// Which store backs the cache, and how large it may grow.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// The store implementation.
    #[serde(default)]
    pub store: StoreKind,
    /// File store root, relative to the project directory.
    #[serde(default = "default_cache_path")]
    pub path: String,
    /// File store size limit in bytes. Accepts an integer or a string such
    /// as `"25MB"`.
    #[serde(default, deserialize_with = "deserialize_byte_size")]
    pub max_size: Option<u64>,
    /// Memory store capacity in entries.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            path: default_cache_path(),
            max_size: None,
            max_entries: default_max_entries(),
        }
    }
}

fn default_cache_path() -> String {
    ".kiln-cache".to_string()
}

fn default_max_entries() -> usize {
    1024
}

/// Cache store implementation.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Bounded in-process LRU map; nothing survives the process.
    Memory,
    /// One JSON file per entry under `cache.path` (default).
    #[default]
    File,
    /// Caches nothing.
    Null,
}

/// Where assets are read from and written to.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetsConfig {
    /// Asset root that source paths are relativized against.
    #[serde(default = "default_root")]
    pub root: String,
    /// Directory digest-named assets are written to.
    #[serde(default = "default_output")]
    pub output: String,
    /// Whether written assets are gzipped.
    #[serde(default)]
    pub compress: CompressMode,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            output: default_output(),
            compress: CompressMode::default(),
        }
    }
}

fn default_root() -> String {
    ".".to_string()
}

fn default_output() -> String {
    "public/assets".to_string()
}

/// Compression policy for asset writes.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompressMode {
    /// Compress iff the destination ends in `.gz` (default).
    #[default]
    Auto,
    /// Always compress.
    Always,
    /// Never compress.
    Never,
}

impl CompressMode {
    /// Returns the explicit compression choice, or `None` to follow the
    /// destination extension.
    pub fn as_option(self) -> Option<bool> {
        match self {
            Self::Auto => None,
            Self::Always => Some(true),
            Self::Never => Some(false),
        }
    }
}

/// Parses a byte count such as `1048576`, `"512KB"`, or `"25 MB"`.
///
/// Suffixes are binary multiples: `KB` is 1024 bytes.
pub fn parse_byte_size(input: &str) -> Option<u64> {
    let s = input.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let value: u64 = digits.parse().ok()?;
    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1 << 10,
        "M" | "MB" | "MIB" => 1 << 20,
        "G" | "GB" | "GIB" => 1 << 30,
        _ => return None,
    };
    value.checked_mul(multiplier)
}

/// Deserializes a byte size given as an integer or a suffixed string.
fn deserialize_byte_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ByteSize;

    impl<'de> Visitor<'de> for ByteSize {
        type Value = u64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a byte count or a size string such as \"25MB\"")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("size must not be negative, got {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            parse_byte_size(v).ok_or_else(|| E::custom(format!("invalid size '{v}'")))
        }
    }

    deserializer.deserialize_any(ByteSize).map(Some)
}
