//! `kiln inspect`: prints an asset's serialized record.

use std::path::Path;

use crate::pipeline::{load_asset, resolve_project};
use crate::{GlobalArgs, InspectArgs};

/// Runs the `kiln inspect` command.
///
/// Builds the asset, or loads it through the configured cache, and prints its
/// record as pretty JSON on stdout.
pub fn run(args: &InspectArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = resolve_project(global)?;
    let asset = load_asset(&project, &args.logical_path, Path::new(&args.source))?;
    println!("{}", serde_json::to_string_pretty(&asset.to_record())?);
    Ok(0)
}
