//! Logging setup for the vitehead CLI.
//!
//! Library events come from the `vitehead` crate through `tracing`; this
//! module installs the subscriber that prints them.
//!
//! Level selection, first match wins:
//! 1. `--verbose`: DEBUG for vitehead crates
//! 2. `--quiet`: ERROR only
//! 3. `RUST_LOG`
//! 4. INFO for vitehead crates

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "vitehead=debug,vitehead_cli=debug";
const QUIET_FILTER: &str = "vitehead=error,vitehead_cli=error";
const DEFAULT_FILTER: &str = "vitehead=info,vitehead_cli=info";

/// Install the global tracing subscriber. Call once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter(verbose, quiet))
        .with(fmt_layer)
        .init();
}

fn filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The subscriber is global and can only be installed once per process,
    // so only the filter selection is checked here.

    #[test]
    fn test_verbose_wins_over_quiet() {
        assert_eq!(filter(true, true).to_string(), EnvFilter::new(VERBOSE_FILTER).to_string());
    }

    #[test]
    fn test_quiet_filter() {
        assert_eq!(filter(false, true).to_string(), EnvFilter::new(QUIET_FILTER).to_string());
    }
}
