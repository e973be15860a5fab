//! Kiln CLI: the command-line interface for the Kiln artifact cache.
//!
//! Provides `kiln key` for computing expanded cache keys, `kiln inspect` for
//! printing an asset's record, `kiln write` for realizing an asset into the
//! output directory, and `kiln fresh` for checking a saved record.

#![warn(missing_docs)]

mod fresh;
mod inspect;
mod key;
mod logging;
mod pipeline;
mod write;

use std::process;

use clap::{Parser, Subcommand};

/// Kiln: a content-addressed build-artifact cache.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Kiln build-artifact cache")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `kiln.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the expanded cache key for a JSON-encoded key.
    Key {
        /// The key, as JSON (e.g. `'["compile", "app.js"]'`).
        key: String,
    },
    /// Print an asset's serialized record.
    Inspect(InspectArgs),
    /// Build an asset and write it to disk.
    Write(WriteArgs),
    /// Check whether a saved asset record is still fresh.
    Fresh {
        /// Path to a JSON file holding the record.
        record: String,
    },
}

/// Arguments for the `kiln inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Logical path of the asset (e.g. `app/app.js`).
    pub logical_path: String,

    /// Source file on disk.
    pub source: String,
}

/// Arguments for the `kiln write` subcommand.
#[derive(Parser, Debug)]
pub struct WriteArgs {
    /// Logical path of the asset (e.g. `app/app.js`).
    pub logical_path: String,

    /// Source file on disk.
    pub source: String,

    /// Destination path (default: `<assets.output>/<digest path>`).
    #[arg(short, long)]
    pub dest: Option<String>,

    /// Always gzip the output.
    #[arg(long, conflicts_with = "no_gzip")]
    pub gzip: bool,

    /// Never gzip the output.
    #[arg(long)]
    pub no_gzip: bool,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    logging::init(&global);

    let result = match cli.command {
        Command::Key { ref key } => key::run(key),
        Command::Inspect(ref args) => inspect::run(args, &global),
        Command::Write(ref args) => write::run(args, &global),
        Command::Fresh { ref record } => fresh::run(std::path::Path::new(record), &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
