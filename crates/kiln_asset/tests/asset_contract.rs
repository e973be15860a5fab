//! Record round-trips, freshness, atomic writes, and cached loading.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use filetime::FileTime;
use kiln_asset::{load_cached, Asset, AssetClass, AssetError, WriteOptions};
use kiln_cache::{Cache, MemoryStore};
use serde_json::json;

fn classify(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some("css") => "text/css".to_string(),
        _ => "application/javascript".to_string(),
    }
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn every_variant(root: &Path) -> Vec<Asset> {
    let a = write(root, "javascripts/a.js", "var a;\n");
    let b = write(root, "javascripts/b.coffee", "b = 1");
    let all = write(root, "javascripts/all.js", "//= require a\n//= require b\n");

    let plain = Asset::from_source(root, "a.js", &a, &classify).unwrap();
    let fixed = Asset::static_from_source(root, "a.js", &a, &classify).unwrap();
    let processed = Asset::processed(root, "b.js", &b, &classify, "var b = 1;\n", &[]).unwrap();
    let bundled =
        Asset::bundled(root, "all.js", &all, &classify, &[plain.clone(), processed.clone()])
            .unwrap();
    vec![plain, fixed, processed, bundled]
}

#[test]
fn every_variant_roundtrips_through_its_record() {
    let dir = tempfile::tempdir().unwrap();
    for asset in every_variant(dir.path()) {
        let record = asset.to_record();
        let back = Asset::from_record(dir.path(), &record).unwrap();
        assert_eq!(back, asset, "{:?} did not round-trip", asset.class());
        assert_eq!(back.to_record(), record);
        assert_eq!(back.source_path(), asset.source_path());
        assert_eq!(back.body().unwrap(), asset.body().unwrap());
    }
}

#[test]
fn records_survive_a_moved_root() {
    let old = tempfile::tempdir().unwrap();
    let new = tempfile::tempdir().unwrap();
    let assets = every_variant(old.path());
    for asset in &assets {
        let record = asset.to_record();
        let text = record.to_string();
        assert!(!text.contains(&*old.path().to_string_lossy()));
        assert!(text.contains("$root/javascripts/"));

        let moved = Asset::from_record(new.path(), &record).unwrap();
        assert_eq!(&moved, asset);
        assert!(moved.source_path().unwrap().starts_with(new.path()));
        for dep in moved.dependencies() {
            assert!(dep.path.starts_with(new.path()));
        }
    }
}

#[test]
fn bundled_record_keeps_required_paths() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = every_variant(dir.path()).pop().unwrap();
    let record = bundle.to_record();
    assert_eq!(record["class"], "BundledAsset");
    assert_eq!(record["required_paths"], json!(["a.js", "b.js"]));
    assert_eq!(record["source"], "var a;\nvar b = 1;\n");
}

#[test]
fn digest_is_ground_truth_for_freshness() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "app.js", "aaaa");
    let asset = Asset::from_source(dir.path(), "app.js", &src, &classify).unwrap();
    assert!(asset.is_fresh());

    let original = FileTime::from_last_modification_time(&std::fs::metadata(&src).unwrap());
    std::fs::write(&src, "bbbb").unwrap();
    filetime::set_file_mtime(&src, original).unwrap();

    let restat = std::fs::metadata(&src).unwrap();
    assert_eq!(Some(restat.len()), asset.length());
    assert!(!asset.is_fresh());
}

#[test]
fn reconstructed_asset_checks_freshness_against_disk() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "app.js", "alert(1)");
    let record = Asset::from_source(dir.path(), "app.js", &src, &classify)
        .unwrap()
        .to_record();

    assert!(Asset::from_record(dir.path(), &record).unwrap().is_fresh());
    std::fs::remove_file(&src).unwrap();
    assert!(!Asset::from_record(dir.path(), &record).unwrap().is_fresh());
}

#[test]
fn logical_path_needs_an_extension() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "app.js", "x");
    for bad in ["app", "app.", "javascripts/app"] {
        let err = Asset::from_source(dir.path(), bad, &src, &classify).unwrap_err();
        assert!(matches!(err, AssetError::InvalidArgument { .. }), "{bad}");
        let err = Asset::processed(dir.path(), bad, &src, &classify, "x", &[]).unwrap_err();
        assert!(matches!(err, AssetError::InvalidArgument { .. }), "{bad}");
    }
}

#[test]
fn failed_write_leaves_no_destination_or_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "app.js", "alert(1)");
    let asset = Asset::static_from_source(dir.path(), "app.js", &src, &classify).unwrap();
    std::fs::remove_file(&src).unwrap();

    let out = dir.path().join("public");
    let dest = out.join(asset.digest_path());
    let err = asset.write_to(&dest, WriteOptions::default()).unwrap_err();
    assert!(matches!(err, AssetError::Io { .. }));
    assert!(!dest.exists());
    assert!(entries(&out).is_empty());

    let gz = out.join("app.js.gz");
    assert!(asset.write_to(&gz, WriteOptions::default()).is_err());
    assert!(entries(&out).is_empty());
}

#[test]
fn failed_write_keeps_existing_destination() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "app.js", "alert(1)");
    let asset = Asset::from_source(dir.path(), "app.js", &src, &classify).unwrap();
    std::fs::remove_file(&src).unwrap();

    let out = dir.path().join("public");
    let dest = write(&out, "app.js", "previous build");
    assert!(asset.write_to(&dest, WriteOptions::uncompressed()).is_err());
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous build");
    assert_eq!(entries(&out), vec!["app.js".to_string()]);
}

#[test]
fn write_sets_file_times_to_asset_mtime() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "app.css", "body { color: red }");
    filetime::set_file_mtime(&src, FileTime::from_unix_time(1_600_000_000, 250_000_000)).unwrap();
    let asset = Asset::from_source(dir.path(), "app.css", &src, &classify).unwrap();
    assert_eq!(asset.mtime(), Some(1_600_000_000));
    assert_eq!(asset.content_type(), "text/css");

    let dest = dir.path().join("out").join(asset.digest_path());
    asset.write_to(&dest, WriteOptions::default()).unwrap();

    let meta = std::fs::metadata(&dest).unwrap();
    assert_eq!(
        FileTime::from_last_modification_time(&meta),
        FileTime::from_unix_time(1_600_000_000, 0)
    );
    assert_eq!(
        FileTime::from_last_access_time(&meta),
        FileTime::from_unix_time(1_600_000_000, 0)
    );
}

#[test]
fn compressed_writes_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "app.js", &"console.log('kiln');\n".repeat(64));
    filetime::set_file_mtime(&src, FileTime::from_unix_time(1_650_000_000, 0)).unwrap();
    let asset = Asset::from_source(dir.path(), "app.js", &src, &classify).unwrap();

    let first = dir.path().join("one/app.js.gz");
    let second = dir.path().join("two/app.js.gz");
    asset.write_to(&first, WriteOptions::default()).unwrap();
    asset.write_to(&second, WriteOptions::default()).unwrap();

    let bytes = std::fs::read(&first).unwrap();
    assert_eq!(bytes, std::fs::read(&second).unwrap());
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    let header_mtime = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    assert_eq!(i64::from(header_mtime), 1_650_000_000);

    let mut body = Vec::new();
    flate2::read::GzDecoder::new(&bytes[..])
        .read_to_end(&mut body)
        .unwrap();
    assert_eq!(body, asset.body().unwrap().as_ref());
}

#[test]
fn explicit_compression_ignores_extension() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "app.js", "alert(1)");
    let asset = Asset::from_source(dir.path(), "app.js", &src, &classify).unwrap();

    let dest = dir.path().join("out/app.js");
    asset.write_to(&dest, WriteOptions::compressed()).unwrap();
    assert_eq!(&std::fs::read(&dest).unwrap()[..2], &[0x1f, 0x8b]);
    assert_eq!(std::fs::read(&src).unwrap(), b"alert(1)");

    let plain = dir.path().join("out/plain.js.gz");
    asset.write_to(&plain, WriteOptions::uncompressed()).unwrap();
    assert_eq!(std::fs::read(&plain).unwrap(), b"alert(1)");
}

#[test]
fn processed_body_is_written_not_source_file() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "app.coffee", "alert 1");
    let asset =
        Asset::processed(dir.path(), "app.js", &src, &classify, "alert(1);\n", &[]).unwrap();
    let dest = dir.path().join("out/app.js");
    asset.write_to(&dest, WriteOptions::default()).unwrap();
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "alert(1);\n");
}

#[test]
fn load_cached_rebuilds_malformed_records() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "app.js", "alert(1)");
    let cache = Cache::new(Arc::new(MemoryStore::new()));
    cache
        .set_raw("app.js", json!({"class": "Widget", "logical_path": "app.js"}))
        .unwrap();

    let mut builds = 0;
    let asset = load_cached(&cache, dir.path(), "app.js", || {
        builds += 1;
        Asset::from_source(dir.path(), "app.js", &src, &classify)
    })
    .unwrap();
    assert_eq!(builds, 1);
    assert_eq!(cache.get_raw("app.js").unwrap(), Some(asset.to_record()));
}

#[test]
fn load_cached_rebuilds_stale_records() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "app.js", "alert(1)");
    let cache = Cache::new(Arc::new(MemoryStore::new()));
    let build = || Asset::from_source(dir.path(), "app.js", &src, &classify);

    let first = load_cached(&cache, dir.path(), "app.js", build).unwrap();
    std::fs::write(&src, "alert(2)").unwrap();
    let second = load_cached(&cache, dir.path(), "app.js", build).unwrap();

    assert_ne!(first.digest(), second.digest());
    assert_eq!(second.body().unwrap().as_ref(), b"alert(2)");
    let stored = cache.get_raw("app.js").unwrap().unwrap();
    assert_eq!(Asset::from_record(dir.path(), &stored).unwrap(), second);
}

#[test]
fn load_cached_rebuilds_when_a_dependency_changes() {
    let dir = tempfile::tempdir().unwrap();
    let src = write(dir.path(), "app.scss", "@import 'vars';");
    let vars = write(dir.path(), "_vars.scss", "$c: red;");
    let cache = Cache::new(Arc::new(MemoryStore::new()));

    let mut builds = 0;
    let mut load = || {
        load_cached(&cache, dir.path(), &("css", "app.css"), || {
            builds += 1;
            Asset::processed(
                dir.path(),
                "app.css",
                &src,
                &classify,
                "a { color: red }",
                std::slice::from_ref(&vars),
            )
        })
        .unwrap()
    };
    load();
    load();
    std::fs::write(&vars, "$c: blue;").unwrap();
    load();
    drop(load);
    assert_eq!(builds, 2);
}

#[test]
fn variants_keep_their_class() {
    let dir = tempfile::tempdir().unwrap();
    let classes: Vec<_> = every_variant(dir.path()).iter().map(Asset::class).collect();
    assert_eq!(
        classes,
        vec![
            AssetClass::Asset,
            AssetClass::Static,
            AssetClass::Processed,
            AssetClass::Bundled
        ]
    );
}
