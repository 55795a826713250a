//! Process-wide store of resolved head fragments.
//!
//! The visible map sits behind a parking_lot `RwLock<Arc<..>>`. A rebuild
//! resolves every entry point into a fresh map without touching the lock and
//! then publishes it with a single assignment, so readers see either the old
//! map or the new one, never a mix. Fragment lists are immutable
//! `Arc<[String]>` and are handed out by reference count.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::heads::resolve_heads;
use crate::manifest::Manifest;

/// Ordered head fragments for one entry point.
pub type Heads = Arc<[String]>;

/// Snapshot of every cached entry point.
pub type HeadMap = HashMap<String, Heads>;

/// What a successful rebuild changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Entry points cached after the rebuild
    pub entrypoints: usize,
    /// Keys that were not cached before
    pub added: Vec<String>,
    /// Keys that were cached before and are gone now
    pub removed: Vec<String>,
    /// Keys whose fragments differ from the previous rebuild
    pub changed: Vec<String>,
    pub unchanged: usize,
    pub duration_ms: u64,
}

impl RebuildReport {
    /// True when the rebuild left every entry point as it was.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct HeadCache {
    entries: RwLock<Arc<HeadMap>>,
}

impl HeadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every `isEntry` key of `manifest` and replace the cache.
    ///
    /// All-or-nothing: if any entry point fails to resolve, the error is
    /// returned and the previously cached heads stay visible.
    pub fn rebuild(&self, manifest: &Manifest, base_path: &str) -> Result<RebuildReport> {
        let started = Instant::now();

        let mut next = HeadMap::new();
        for (key, _) in manifest.entrypoints() {
            let heads = resolve_heads(manifest, key, base_path).map_err(|source| {
                Error::Resolve {
                    entry: key.to_string(),
                    source,
                }
            })?;
            tracing::debug!(entry = key, fragments = heads.len(), "resolved heads");
            next.insert(key.to_string(), Heads::from(heads));
        }

        let previous = self.snapshot();
        let mut report = diff(&previous, &next);
        report.entrypoints = next.len();

        *self.entries.write() = Arc::new(next);

        report.duration_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Cached fragments for `entrypoint`.
    pub fn get(&self, entrypoint: &str) -> Result<Heads> {
        self.entries
            .read()
            .get(entrypoint)
            .cloned()
            .ok_or_else(|| Error::NotFound(entrypoint.to_string()))
    }

    /// Cached fragments joined with newlines.
    pub fn get_string(&self, entrypoint: &str) -> Result<String> {
        Ok(self.get(entrypoint)?.join("\n"))
    }

    /// The map currently visible to readers.
    pub fn snapshot(&self) -> Arc<HeadMap> {
        Arc::clone(&self.entries.read())
    }

    /// Cached entry point keys, sorted.
    pub fn entrypoints(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.snapshot().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every cached entry point.
    pub fn clear(&self) {
        *self.entries.write() = Arc::default();
    }
}

fn diff(previous: &HeadMap, next: &HeadMap) -> RebuildReport {
    let mut report = RebuildReport::default();

    for (key, heads) in next {
        match previous.get(key) {
            None => report.added.push(key.clone()),
            Some(old) if old != heads => report.changed.push(key.clone()),
            Some(_) => report.unchanged += 1,
        }
    }
    report.removed = previous
        .keys()
        .filter(|key| !next.contains_key(*key))
        .cloned()
        .collect();

    report.added.sort();
    report.changed.sort();
    report.removed.sort();
    report
}
