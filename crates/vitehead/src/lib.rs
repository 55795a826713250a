//! # vitehead
//!
//! Server-side integration for Vite builds: turns the entry points of a
//! `manifest.json` into the `<script>` and `<link>` tags a page needs, and
//! keeps them current while the manifest changes on disk.
//!
//! - [`manifest`] - typed manifest model and decoder
//! - [`heads`] - depth-first head tag resolution and dev server tags
//! - [`cache`] - concurrent, atomically swapped store of resolved heads
//! - [`watcher`] - filesystem subscription for the manifest file
//! - [`service`] - the [`Vite`] facade tying them together
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use vitehead::{Vite, ViteConfig};
//!
//! # async fn run() -> vitehead::Result<()> {
//! let vite = Arc::new(Vite::load(ViteConfig::load(None)?)?);
//! let cancel = CancellationToken::new();
//! let watcher = vite.spawn_watch(cancel.clone());
//!
//! let head = vite.get_heads_string("src/main.ts")?;
//! println!("{head}");
//!
//! cancel.cancel();
//! let _ = watcher.await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod heads;
pub mod manifest;
pub mod service;
pub mod watcher;

pub use cache::{HeadCache, HeadMap, Heads, RebuildReport};
pub use config::{ViteConfig, WatchConfig};
pub use error::{Error, ResolveError, Result, WatchEventKind};
pub use heads::{dev_heads, resolve_heads, HeadTag};
pub use manifest::{Manifest, ManifestEntry};
pub use service::Vite;
pub use watcher::{ManifestChange, ManifestWatcher};

/// Re-exported so callers can drive [`Vite::watch`] without a direct dependency.
pub use tokio_util::sync::CancellationToken;
