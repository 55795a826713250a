//! Errors returned by CLI commands and their miette rendering.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Vite(#[from] vitehead::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),

    /// `check` found entry points that do not resolve
    #[error("{failed} of {total} entry points failed to resolve")]
    CheckFailed { failed: usize, total: usize },
}

/// Convert a command error into a diagnostic with an actionable hint.
pub fn cli_error_to_miette(err: CliError) -> miette::Report {
    match err {
        CliError::Vite(vitehead::Error::Config { field, hint }) => {
            miette::miette!("Invalid value for '{}'\n\nHint: {}", field, hint)
        }
        CliError::Vite(e) if e.is_decode() => miette::miette!(
            "{}\n\nHint: Run `vite build` with build.manifest enabled, or pass --manifest <FILE>",
            e
        ),
        CliError::Vite(e @ vitehead::Error::Resolve { .. }) => miette::miette!(
            "{}\n\nHint: The manifest references a chunk it does not contain; rebuild the assets",
            e
        ),
        CliError::Vite(vitehead::Error::NotFound(entry)) => miette::miette!(
            "'{}' is not an entry point in the manifest\n\nHint: Run `vitehead check` to list the entry points",
            entry
        ),
        _ => miette::miette!("{}", err),
    }
}
