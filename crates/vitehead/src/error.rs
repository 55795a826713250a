//! Error types for manifest loading, head resolution and cache queries.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    // Manifest loading errors
    #[error("failed to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read manifest stream: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to decode manifest: {0}")]
    Decode(#[from] serde_json::Error),

    // Resolution errors
    #[error("failed to resolve heads for '{entry}': {source}")]
    Resolve {
        entry: String,
        #[source]
        source: ResolveError,
    },

    // Query errors
    #[error("no heads cached for entry point '{0}'")]
    NotFound(String),

    // Watcher errors
    #[error("failed to subscribe to manifest changes: {0}")]
    WatchSubscribe(#[from] notify::Error),

    #[error("manifest {} was {kind}; keeping the previously loaded heads", path.display())]
    WatchEvent { path: PathBuf, kind: WatchEventKind },

    // Configuration errors
    #[error("invalid value for '{field}': {hint}")]
    Config { field: &'static str, hint: String },
}

impl Error {
    /// True for errors raised while reading or decoding the manifest file.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Io { .. } | Error::Read(_) | Error::Decode(_))
    }
}

/// Failure while walking the import graph of a single entry point.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("entry not found in manifest: {0}")]
    EntryNotFound(String),

    #[error("cyclic import: {}", .0.join(" -> "))]
    CyclicImport(Vec<String>),
}

impl ResolveError {
    /// The manifest key at which resolution stopped.
    pub fn key(&self) -> &str {
        match self {
            ResolveError::EntryNotFound(key) => key,
            ResolveError::CyclicImport(chain) => chain.last().map(String::as_str).unwrap_or(""),
        }
    }
}

/// Manifest events that are reported but never acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Removed,
    Renamed,
}

impl std::fmt::Display for WatchEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchEventKind::Removed => f.write_str("removed"),
            WatchEventKind::Renamed => f.write_str("renamed"),
        }
    }
}
