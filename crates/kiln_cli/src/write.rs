//! `kiln write`: builds an asset and writes it to the output directory.

use std::path::{Path, PathBuf};

use kiln_asset::WriteOptions;

use crate::pipeline::{load_asset, resolve_project};
use crate::{GlobalArgs, WriteArgs};

/// Resolves the compression choice: flags override the configured mode.
pub fn compress_choice(args: &WriteArgs, configured: Option<bool>) -> Option<bool> {
    if args.gzip {
        Some(true)
    } else if args.no_gzip {
        Some(false)
    } else {
        configured
    }
}

/// Runs the `kiln write` command.
///
/// Without `--dest`, the asset lands at `<output>/<digest_path>`, with a
/// `.gz` suffix appended when it is compressed.
pub fn run(args: &WriteArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = resolve_project(global)?;
    let asset = load_asset(&project, &args.logical_path, Path::new(&args.source))?;
    let compress = compress_choice(args, project.config.assets.compress.as_option());

    let dest = match &args.dest {
        Some(dest) => PathBuf::from(dest),
        None => {
            let mut name = asset.digest_path();
            if compress == Some(true) {
                name.push_str(".gz");
            }
            project.output_dir().join(name)
        }
    };

    asset.write_to(&dest, WriteOptions { compress })?;
    if !global.quiet {
        eprintln!("   Wrote {} -> {}", asset.logical_path(), dest.display());
    }
    Ok(0)
}
