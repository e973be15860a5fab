//! The asset entity and its variant family.
//!
//! An [`Asset`] is an immutable, content-addressed artifact: it carries a
//! logical path, the source it came from, and the digest of its realized
//! body. Identity is the tuple (variant, logical path, mtime, digest).

use std::borrow::Cow;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use kiln_common::ContentHash;

use crate::error::AssetError;
use crate::path::{splice_digest, validate_logical_path};
use crate::source::SourceHasher;

/// Derives a MIME content type from a source path.
///
/// Any `Fn(&Path) -> String` is a classifier.
pub trait ContentClassifier {
    /// Returns the content type of the file at `source_path`.
    fn content_type(&self, source_path: &Path) -> String;
}

impl<F> ContentClassifier for F
where
    F: Fn(&Path) -> String,
{
    fn content_type(&self, source_path: &Path) -> String {
        self(source_path)
    }
}

/// Tag identifying the concrete variant of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    /// A plain asset whose body is its source file.
    Asset,
    /// A static asset served as-is from its source file.
    Static,
    /// An asset whose body was produced by a processor.
    Processed,
    /// An asset whose body concatenates other assets.
    Bundled,
}

impl AssetClass {
    /// Returns the tag stored in the record's `class` field.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Asset => "Asset",
            Self::Static => "StaticAsset",
            Self::Processed => "ProcessedAsset",
            Self::Bundled => "BundledAsset",
        }
    }

    /// Parses a record tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Asset" => Some(Self::Asset),
            "StaticAsset" => Some(Self::Static),
            "ProcessedAsset" => Some(Self::Processed),
            "BundledAsset" => Some(Self::Bundled),
            _ => None,
        }
    }
}

/// One file a derived body was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Location of the file on disk.
    pub path: PathBuf,
    /// Modification time in whole seconds, if known.
    pub mtime: Option<i64>,
    /// Content digest at build time.
    pub digest: ContentHash,
}

impl Dependency {
    /// Stats and digests the file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, AssetError> {
        let stat = SourceHasher::stat(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            mtime: Some(stat.mtime),
            digest: SourceHasher::hash_file(path)?,
        })
    }
}

/// Body and provenance of a processed or bundled asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Derived {
    pub(crate) source: String,
    pub(crate) dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Variant {
    Asset,
    Static,
    Processed(Derived),
    Bundled {
        derived: Derived,
        required_paths: Vec<String>,
    },
}

impl Variant {
    fn class(&self) -> AssetClass {
        match self {
            Self::Asset => AssetClass::Asset,
            Self::Static => AssetClass::Static,
            Self::Processed(_) => AssetClass::Processed,
            Self::Bundled { .. } => AssetClass::Bundled,
        }
    }

    fn derived(&self) -> Option<&Derived> {
        match self {
            Self::Processed(derived) | Self::Bundled { derived, .. } => Some(derived),
            Self::Asset | Self::Static => None,
        }
    }
}

/// An immutable build artifact with serializable metadata.
#[derive(Debug, Clone)]
pub struct Asset {
    pub(crate) root: PathBuf,
    pub(crate) logical_path: String,
    pub(crate) source_path: Option<PathBuf>,
    pub(crate) content_type: String,
    pub(crate) mtime: Option<i64>,
    pub(crate) length: Option<u64>,
    pub(crate) digest: ContentHash,
    pub(crate) variant: Variant,
}

impl Asset {
    /// Builds a plain asset from a live source file.
    ///
    /// Fails with [`AssetError::InvalidArgument`] if `logical_path` has no
    /// extension, or [`AssetError::Io`] if the source cannot be read.
    pub fn from_source(
        root: impl Into<PathBuf>,
        logical_path: impl Into<String>,
        source_path: impl Into<PathBuf>,
        classifier: &dyn ContentClassifier,
    ) -> Result<Self, AssetError> {
        Self::build_from_file(
            root.into(),
            logical_path.into(),
            source_path.into(),
            classifier,
            Variant::Asset,
        )
    }

    /// Builds a static asset from a live source file.
    pub fn static_from_source(
        root: impl Into<PathBuf>,
        logical_path: impl Into<String>,
        source_path: impl Into<PathBuf>,
        classifier: &dyn ContentClassifier,
    ) -> Result<Self, AssetError> {
        Self::build_from_file(
            root.into(),
            logical_path.into(),
            source_path.into(),
            classifier,
            Variant::Static,
        )
    }

    fn build_from_file(
        root: PathBuf,
        logical_path: String,
        source_path: PathBuf,
        classifier: &dyn ContentClassifier,
        variant: Variant,
    ) -> Result<Self, AssetError> {
        validate_logical_path(&logical_path)?;
        let stat = SourceHasher::stat(&source_path)?;
        let digest = SourceHasher::hash_file(&source_path)?;
        Ok(Self {
            root,
            logical_path,
            content_type: classifier.content_type(&source_path),
            source_path: Some(source_path),
            mtime: Some(stat.mtime),
            length: Some(stat.len),
            digest,
            variant,
        })
    }

    /// Builds a processed asset from a body produced by a processor.
    ///
    /// The source file and every path in `dependencies` are stat'ed and
    /// digested so that freshness can later be checked against each of them.
    pub fn processed(
        root: impl Into<PathBuf>,
        logical_path: impl Into<String>,
        source_path: impl Into<PathBuf>,
        classifier: &dyn ContentClassifier,
        body: impl Into<String>,
        dependencies: &[PathBuf],
    ) -> Result<Self, AssetError> {
        let logical_path = logical_path.into();
        validate_logical_path(&logical_path)?;
        let source_path = source_path.into();

        let mut deps = vec![Dependency::from_file(&source_path)?];
        for path in dependencies {
            if !deps.iter().any(|d| &d.path == path) {
                deps.push(Dependency::from_file(path)?);
            }
        }

        Ok(Self::derived(
            root.into(),
            logical_path,
            source_path,
            classifier,
            body.into(),
            deps,
            Variant::Processed,
        ))
    }

    /// Builds a bundled asset by concatenating the bodies of `parts` in order.
    ///
    /// The bundle depends on its own source file plus every dependency of its
    /// parts; `required_paths` records the parts' logical paths.
    pub fn bundled(
        root: impl Into<PathBuf>,
        logical_path: impl Into<String>,
        source_path: impl Into<PathBuf>,
        classifier: &dyn ContentClassifier,
        parts: &[Asset],
    ) -> Result<Self, AssetError> {
        let logical_path = logical_path.into();
        validate_logical_path(&logical_path)?;
        let source_path = source_path.into();

        let mut body = Vec::new();
        let mut deps = vec![Dependency::from_file(&source_path)?];
        let mut required_paths = Vec::with_capacity(parts.len());
        for part in parts {
            body.extend_from_slice(&part.body()?);
            for dep in part.dependencies() {
                if !deps.iter().any(|d| d.path == dep.path) {
                    deps.push(dep);
                }
            }
            required_paths.push(part.logical_path.clone());
        }
        let body = String::from_utf8(body).map_err(|e| AssetError::InvalidArgument {
            reason: format!("bundle '{logical_path}' is not valid UTF-8: {e}"),
        })?;

        Ok(Self::derived(
            root.into(),
            logical_path,
            source_path,
            classifier,
            body,
            deps,
            move |derived| Variant::Bundled {
                derived,
                required_paths,
            },
        ))
    }

    fn derived(
        root: PathBuf,
        logical_path: String,
        source_path: PathBuf,
        classifier: &dyn ContentClassifier,
        source: String,
        dependencies: Vec<Dependency>,
        variant: impl FnOnce(Derived) -> Variant,
    ) -> Self {
        let mtime = dependencies.iter().filter_map(|d| d.mtime).max();
        Self {
            root,
            logical_path,
            content_type: classifier.content_type(&source_path),
            source_path: Some(source_path),
            mtime,
            length: Some(source.len() as u64),
            digest: ContentHash::from_bytes(source.as_bytes()),
            variant: variant(Derived {
                source,
                dependencies,
            }),
        }
    }

    /// Returns the concrete variant.
    pub fn class(&self) -> AssetClass {
        self.variant.class()
    }

    /// Returns the root source paths are relativized against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the logical path, e.g. `app/app.js`.
    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }

    /// Returns the source file location, if known.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Returns the MIME content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the modification time in whole seconds since the epoch.
    pub fn mtime(&self) -> Option<i64> {
        self.mtime
    }

    /// Returns the body length in bytes.
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    /// Returns the digest of the realized body.
    pub fn digest(&self) -> ContentHash {
        self.digest
    }

    /// Returns the logical path with the digest spliced in before the extension.
    pub fn digest_path(&self) -> String {
        splice_digest(&self.logical_path, &self.digest.to_hex())
    }

    /// Returns the processed or bundled source text, if this is a derived asset.
    pub fn source(&self) -> Option<&str> {
        self.variant.derived().map(|d| d.source.as_str())
    }

    /// Returns the logical paths of a bundle's parts. Empty for other variants.
    pub fn required_paths(&self) -> &[String] {
        match &self.variant {
            Variant::Bundled { required_paths, .. } => required_paths,
            _ => &[],
        }
    }

    /// Returns every file this asset's body was derived from.
    ///
    /// For derived variants these are the recorded dependencies; for file
    /// backed variants it is the source file itself, when known.
    pub fn dependencies(&self) -> Vec<Dependency> {
        match self.variant.derived() {
            Some(derived) => derived.dependencies.clone(),
            None => self
                .source_path
                .iter()
                .map(|path| Dependency {
                    path: path.clone(),
                    mtime: self.mtime,
                    digest: self.digest,
                })
                .collect(),
        }
    }

    /// Returns the realized body.
    ///
    /// File-backed variants read their source from disk; derived variants
    /// return the stored text.
    pub fn body(&self) -> Result<Cow<'_, [u8]>, AssetError> {
        if let Some(derived) = self.variant.derived() {
            return Ok(Cow::Borrowed(derived.source.as_bytes()));
        }
        let path = self.require_source_path()?;
        std::fs::read(path)
            .map(Cow::Owned)
            .map_err(|e| AssetError::io(path, e))
    }

    pub(crate) fn require_source_path(&self) -> Result<&Path, AssetError> {
        self.source_path
            .as_deref()
            .ok_or_else(|| AssetError::MissingSource {
                logical_path: self.logical_path.clone(),
            })
    }

    /// Checks freshness against the live contents on disk.
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_with(|path| SourceHasher::hash_file(path).ok())
    }

    /// Checks freshness using `live_digest` to digest the current sources.
    ///
    /// `live_digest` returns `None` for a file that cannot be read, which
    /// makes the asset stale. An asset with an unknown source path, or a
    /// derived asset with no recorded dependencies, is stale.
    pub fn is_fresh_with<F>(&self, mut live_digest: F) -> bool
    where
        F: FnMut(&Path) -> Option<ContentHash>,
    {
        match self.variant.derived() {
            Some(derived) => {
                !derived.dependencies.is_empty()
                    && derived
                        .dependencies
                        .iter()
                        .all(|dep| live_digest(&dep.path) == Some(dep.digest))
            }
            None => match &self.source_path {
                Some(path) => live_digest(path) == Some(self.digest),
                None => false,
            },
        }
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.class() == other.class()
            && self.logical_path == other.logical_path
            && self.mtime == other.mtime
            && self.digest == other.digest
    }
}

impl Eq for Asset {}

impl Hash for Asset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class().hash(state);
        self.logical_path.hash(state);
        self.mtime.hash(state);
        self.digest.hash(state);
    }
}
