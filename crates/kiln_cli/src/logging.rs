//! Tracing subscriber setup for the `kiln` binary.

use tracing_subscriber::filter::EnvFilter;

use crate::GlobalArgs;

/// Returns the default filter directive for the global verbosity flags.
pub fn default_directive(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Installs a stderr subscriber. `RUST_LOG` takes precedence over the flags.
pub fn init(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(global)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(quiet: bool, verbose: bool) -> GlobalArgs {
        GlobalArgs {
            quiet,
            verbose,
            config: None,
        }
    }

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(default_directive(&global(true, true)), "error");
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(default_directive(&global(false, true)), "debug");
        assert_eq!(default_directive(&global(false, false)), "warn");
    }
}
