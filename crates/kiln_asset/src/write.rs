//! Atomic realization of asset bodies to disk.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use filetime::FileTime;
use flate2::{Compression, GzBuilder};
use kiln_common::ContentHash;
use tempfile::NamedTempFile;

use crate::asset::Asset;
use crate::error::AssetError;

/// Options controlling [`Asset::write_to`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Whether to gzip the body. `None` compresses iff the destination ends
    /// in `.gz`.
    pub compress: Option<bool>,
}

impl WriteOptions {
    /// Always gzip the body.
    pub fn compressed() -> Self {
        Self {
            compress: Some(true),
        }
    }

    /// Never gzip the body.
    pub fn uncompressed() -> Self {
        Self {
            compress: Some(false),
        }
    }

    /// Resolves whether a write to `dest` is compressed.
    pub fn compresses(&self, dest: &Path) -> bool {
        self.compress
            .unwrap_or_else(|| dest.extension().is_some_and(|ext| ext == "gz"))
    }
}

impl Asset {
    /// Writes the realized body to `dest`.
    ///
    /// The body goes through a temporary file in the destination directory
    /// that is renamed over `dest` only once fully written, so a failure
    /// leaves `dest` absent or untouched. The temporary is removed on every
    /// error path. On success the file's access and modification times are
    /// set to the asset's mtime, and a gzip header carries the same mtime.
    ///
    /// Plain and static assets stream their body from the source file and
    /// hash it on the way through. If those bytes no longer match
    /// [`Asset::digest`] the write fails with [`AssetError::Stale`] and the
    /// destination is left as it was.
    pub fn write_to(&self, dest: &Path, options: WriteOptions) -> Result<(), AssetError> {
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| AssetError::io(dir, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| AssetError::io(dir, e))?;
        if options.compresses(dest) {
            let mtime = self.mtime.and_then(|t| u32::try_from(t).ok()).unwrap_or(0);
            let mut encoder = GzBuilder::new()
                .mtime(mtime)
                .write(tmp.as_file_mut(), Compression::best());
            self.copy_body(&mut encoder)?;
            encoder.finish().map_err(|e| AssetError::io(dest, e))?;
        } else {
            self.copy_body(tmp.as_file_mut())?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| AssetError::io(tmp.path(), e))?;
        tmp.persist(dest).map_err(|e| AssetError::io(dest, e.error))?;

        if let Some(mtime) = self.mtime {
            let time = FileTime::from_unix_time(mtime, 0);
            filetime::set_file_times(dest, time, time).map_err(|e| {
                tracing::warn!(path = %dest.display(), error = %e, "failed to set file times");
                AssetError::io(dest, e)
            })?;
        }

        tracing::debug!(
            logical_path = %self.logical_path,
            dest = %dest.display(),
            "wrote asset"
        );
        Ok(())
    }

    /// Streams the body into `out`.
    fn copy_body<W: Write>(&self, out: &mut W) -> Result<(), AssetError> {
        match self.source() {
            Some(source) => out
                .write_all(source.as_bytes())
                .map_err(|e| AssetError::io(&self.logical_path, e)),
            None => {
                let path = self.require_source_path()?;
                let file = File::open(path).map_err(|e| AssetError::io(path, e))?;
                let tee = Tee {
                    inner: BufReader::new(file),
                    sink: out,
                };
                let streamed =
                    ContentHash::from_reader(tee).map_err(|e| AssetError::io(path, e))?;
                if streamed != self.digest {
                    return Err(AssetError::Stale {
                        logical_path: self.logical_path.clone(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// Copies every byte read from `inner` into `sink`.
struct Tee<'a, R, W> {
    inner: R,
    sink: &'a mut W,
}

impl<R: Read, W: Write> Read for Tee<'_, R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.sink.write_all(&buf[..n])?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn compression_follows_extension_by_default() {
        let opts = WriteOptions::default();
        assert!(opts.compresses(Path::new("out/app.js.gz")));
        assert!(!opts.compresses(Path::new("out/app.js")));
        assert!(!opts.compresses(Path::new("out/gz")));
    }

    #[test]
    fn explicit_compression_overrides_extension() {
        assert!(WriteOptions::compressed().compresses(Path::new("app.js")));
        assert!(!WriteOptions::uncompressed().compresses(Path::new("app.js.gz")));
    }

    #[test]
    fn writes_body_into_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("app.js");
        std::fs::write(&src, "alert(1)").unwrap();
        let classify = |_: &Path| "text/javascript".to_string();
        let asset = Asset::from_source(dir.path(), "app.js", &src, &classify).unwrap();

        let dest: PathBuf = dir.path().join("public/assets/app.js");
        asset.write_to(&dest, WriteOptions::default()).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"alert(1)");

        let meta = std::fs::metadata(&dest).unwrap();
        let mtime = FileTime::from_last_modification_time(&meta);
        assert_eq!(Some(mtime.unix_seconds()), asset.mtime());
    }

    #[test]
    fn changed_source_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("app.js");
        std::fs::write(&src, "alert(1)").unwrap();
        let classify = |_: &Path| "text/javascript".to_string();
        let asset = Asset::from_source(dir.path(), "app.js", &src, &classify).unwrap();
        std::fs::write(&src, "alert(2)").unwrap();

        let out = dir.path().join("out");
        let err = asset
            .write_to(&out.join(asset.digest_path()), WriteOptions::default())
            .unwrap_err();
        assert!(matches!(err, AssetError::Stale { .. }));
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }
}
