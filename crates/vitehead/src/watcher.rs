//! Manifest file watcher.
//!
//! Watches the directory containing the manifest (non-recursively) and turns
//! raw notify events into [`ManifestChange`]s sent through a channel. The
//! watcher never touches the head cache itself; the receiving loop owns every
//! rebuild.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Manifest-relevant change observed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestChange {
    /// Manifest was created, written, or renamed into place
    Written(PathBuf),
    /// Manifest was deleted
    Removed(PathBuf),
    /// Manifest was renamed away
    Renamed(PathBuf),
    /// The watched directory itself went away; the subscription is dead
    DirectoryRemoved(PathBuf),
}

impl ManifestChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            ManifestChange::Written(p)
            | ManifestChange::Removed(p)
            | ManifestChange::Renamed(p)
            | ManifestChange::DirectoryRemoved(p) => p,
        }
    }
}

/// Messages delivered to the watch loop.
pub type WatchMessage = notify::Result<ManifestChange>;

/// Live subscription to manifest changes.
///
/// Dropping it releases the underlying OS watch.
pub struct ManifestWatcher {
    _watcher: RecommendedWatcher,
    manifest_path: PathBuf,
    dir: PathBuf,
}

impl ManifestWatcher {
    /// Subscribe to changes of `manifest_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WatchSubscribe`] if the watcher cannot be created or
    /// the containing directory cannot be watched (e.g. it does not exist yet).
    pub fn subscribe(manifest_path: &Path) -> Result<(Self, mpsc::Receiver<WatchMessage>)> {
        let dir = watch_dir(manifest_path);
        let file_name = manifest_path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| Error::Config {
                field: "manifestPath",
                hint: format!("'{}' does not name a file", manifest_path.display()),
            })?;

        let (tx, rx) = mpsc::channel(100);

        let callback_dir = dir.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let message = match res {
                Ok(event) if is_dir_removal(&event, &callback_dir) => {
                    Ok(ManifestChange::DirectoryRemoved(callback_dir.clone()))
                }
                Ok(event) => match classify(&event, &callback_dir, &file_name) {
                    Some(change) => Ok(change),
                    None => return,
                },
                Err(e) => Err(e),
            };
            // Receiver gone means the loop shut down; nothing left to notify.
            let _ = tx.blocking_send(message);
        })?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::debug!(dir = %dir.display(), "subscribed to manifest changes");

        Ok((
            Self {
                _watcher: watcher,
                manifest_path: manifest_path.to_path_buf(),
                dir,
            },
            rx,
        ))
    }

    /// Subscribe, retrying every `retry_interval` until it works.
    ///
    /// Returns `None` only when `cancel` fires first.
    pub async fn subscribe_with_retry(
        manifest_path: &Path,
        retry_interval: Duration,
        cancel: &CancellationToken,
    ) -> Option<(Self, mpsc::Receiver<WatchMessage>)> {
        loop {
            match Self::subscribe(manifest_path) {
                Ok(subscription) => return Some(subscription),
                Err(e) => {
                    tracing::warn!(
                        manifest = %manifest_path.display(),
                        retry_in_ms = retry_interval.as_millis() as u64,
                        "{e}"
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(retry_interval) => {}
            }
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Get the directory being watched.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn watch_dir(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Map a raw notify event onto the manifest, if it concerns it.
fn classify(event: &Event, dir: &Path, file_name: &OsString) -> Option<ManifestChange> {
    let is_manifest = |path: &Path| path.file_name() == Some(file_name.as_os_str());
    let manifest = event.paths.iter().find(|p| is_manifest(p.as_path()))?.clone();

    match event.kind {
        EventKind::Remove(_) => Some(ManifestChange::Removed(manifest)),
        EventKind::Create(_)
        | EventKind::Access(AccessKind::Close(AccessMode::Write))
        | EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Other) => Some(ManifestChange::Written(manifest)),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::To => Some(ManifestChange::Written(manifest)),
            RenameMode::From => Some(ManifestChange::Renamed(manifest)),
            // paths are [from, to]
            RenameMode::Both => match event.paths.get(1) {
                Some(to) if is_manifest(to.as_path()) => Some(ManifestChange::Written(to.clone())),
                _ => Some(ManifestChange::Renamed(manifest)),
            },
            RenameMode::Any | RenameMode::Other => {
                if dir.join(file_name).exists() {
                    Some(ManifestChange::Written(manifest))
                } else {
                    Some(ManifestChange::Renamed(manifest))
                }
            }
        },
        _ => None,
    }
}

/// Detect removal of the watched directory itself.
fn is_dir_removal(event: &Event, dir: &Path) -> bool {
    matches!(event.kind, EventKind::Remove(_)) && event.paths.iter().any(|p| p == dir)
}
