//! `kiln fresh`: checks a serialized asset record against the files on disk.

use std::path::Path;

use kiln_asset::Asset;

use crate::pipeline::resolve_project;
use crate::GlobalArgs;

/// Runs the `kiln fresh` command.
///
/// Returns exit code 0 if the record is fresh, 1 if it is stale or malformed.
pub fn run(record: &Path, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = resolve_project(global)?;
    let text = std::fs::read_to_string(record)?;
    Ok(check(&project.asset_root(), &text, global.quiet))
}

/// Checks one record's text. A record that does not parse is stale.
pub fn check(root: &Path, text: &str, quiet: bool) -> i32 {
    let asset = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| Asset::try_from_record(root, &value));
    let (code, status) = match asset {
        Some(asset) if asset.is_fresh() => (0, "fresh"),
        Some(_) => (1, "stale"),
        None => (1, "stale (malformed record)"),
    };
    if !quiet {
        eprintln!("   {status}");
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::content_type_for;

    #[test]
    fn fresh_then_stale() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("app.js");
        std::fs::write(&src, "alert(1)").unwrap();
        let asset = Asset::from_source(dir.path(), "app.js", &src, &content_type_for).unwrap();
        let text = asset.to_record().to_string();

        assert_eq!(check(dir.path(), &text, true), 0);
        std::fs::write(&src, "alert(2)").unwrap();
        assert_eq!(check(dir.path(), &text, true), 1);
    }

    #[test]
    fn malformed_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(check(dir.path(), "{not json", true), 1);
        assert_eq!(check(dir.path(), r#"{"class": "Widget"}"#, true), 1);
    }
}
