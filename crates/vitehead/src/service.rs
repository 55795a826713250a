//! The head resolver service.
//!
//! [`Vite`] owns the configuration and the [`HeadCache`]. Request handlers
//! hold it behind an `Arc` and call [`Vite::get_heads`]; one background task
//! runs [`Vite::watch`] and is the only writer after startup.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::{HeadCache, Heads, RebuildReport};
use crate::config::ViteConfig;
use crate::error::{Error, Result, WatchEventKind};
use crate::heads::dev_heads;
use crate::manifest::Manifest;
use crate::watcher::{ManifestChange, ManifestWatcher, WatchMessage};

#[derive(Debug)]
pub struct Vite {
    config: ViteConfig,
    cache: HeadCache,
}

impl Vite {
    /// Create the service with an empty cache. Nothing is read from disk.
    pub fn new(config: ViteConfig) -> Self {
        Self {
            config,
            cache: HeadCache::new(),
        }
    }

    /// Validate `config`, create the service and load the manifest once.
    ///
    /// In dev mode the manifest is never read.
    pub fn load(config: ViteConfig) -> Result<Self> {
        config.validate()?;
        let vite = Self::new(config);
        vite.rebuild()?;
        Ok(vite)
    }

    pub fn config(&self) -> &ViteConfig {
        &self.config
    }

    pub fn cache(&self) -> &HeadCache {
        &self.cache
    }

    pub fn is_dev(&self) -> bool {
        self.config.dev_mode
    }

    /// Re-read the manifest and replace the cached heads.
    ///
    /// On failure the previously cached heads stay in place.
    pub fn rebuild(&self) -> Result<RebuildReport> {
        if self.is_dev() {
            tracing::debug!("dev mode: skipping manifest rebuild");
            return Ok(RebuildReport::default());
        }

        let manifest = Manifest::from_path(&self.config.manifest_path)?;
        let report = self.cache.rebuild(&manifest, &self.config.base_path)?;

        tracing::info!(
            manifest = %self.config.manifest_path.display(),
            entrypoints = report.entrypoints,
            added = report.added.len(),
            removed = report.removed.len(),
            changed = report.changed.len(),
            duration_ms = report.duration_ms,
            "manifest loaded"
        );
        Ok(report)
    }

    /// Head fragments for `entrypoint`.
    ///
    /// In dev mode this always succeeds with the dev server client and the
    /// entry module, without consulting the cache.
    pub fn get_heads(&self, entrypoint: &str) -> Result<Heads> {
        if self.is_dev() {
            return Ok(Heads::from(dev_heads(&self.config.dev_host, entrypoint)));
        }
        self.cache.get(entrypoint)
    }

    /// Head fragments for `entrypoint`, one per line.
    pub fn get_heads_string(&self, entrypoint: &str) -> Result<String> {
        Ok(self.get_heads(entrypoint)?.join("\n"))
    }

    /// Run the manifest watcher on a new task.
    pub fn spawn_watch(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).watch(cancel))
    }

    /// Keep the cache in sync with the manifest file until `cancel` fires.
    ///
    /// Subscription failures are retried every `watch.retryIntervalMs`. Failed
    /// rebuilds are logged and the loop keeps listening. Returns immediately
    /// in dev mode.
    pub async fn watch(self: Arc<Self>, cancel: CancellationToken) {
        if self.is_dev() {
            tracing::debug!("dev mode: manifest watcher not started");
            return;
        }

        let manifest_path = self.config.manifest_path.clone();
        let retry_interval = self.config.watch.retry_interval();
        let debounce = self.config.watch.debounce();

        while let Some((watcher, mut rx)) =
            ManifestWatcher::subscribe_with_retry(&manifest_path, retry_interval, &cancel).await
        {
            tracing::info!(dir = %watcher.dir().display(), "watching manifest for changes");

            // The manifest may have been written while nobody was listening.
            if manifest_path.exists() {
                self.rebuild_logged();
            }

            let resubscribe = loop {
                tokio::select! {
                    _ = cancel.cancelled() => break false,
                    message = rx.recv() => match message {
                        Some(Ok(change)) => {
                            if !self.handle_change(change, &mut rx, debounce).await {
                                break true;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::error!("manifest watcher failed: {e}");
                            break true;
                        }
                        None => break true,
                    },
                }
            };
            drop(watcher);

            if !resubscribe {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(retry_interval) => {}
            }
        }

        tracing::info!(manifest = %manifest_path.display(), "manifest watcher stopped");
    }

    /// Handle one change plus anything queued behind it within `debounce`.
    ///
    /// Returns false when the subscription is no longer usable.
    async fn handle_change(
        &self,
        first: ManifestChange,
        rx: &mut mpsc::Receiver<WatchMessage>,
        debounce: Duration,
    ) -> bool {
        if matches!(first, ManifestChange::Written(_)) && !debounce.is_zero() {
            tokio::time::sleep(debounce).await;
        }

        let mut batch = vec![first];
        let mut alive = true;
        while let Ok(message) = rx.try_recv() {
            match message {
                Ok(change) => batch.push(change),
                Err(e) => {
                    tracing::error!("manifest watcher failed: {e}");
                    alive = false;
                }
            }
        }

        let mut written = false;
        for change in batch {
            match change {
                ManifestChange::Written(path) => {
                    tracing::debug!(path = %path.display(), "manifest changed");
                    written = true;
                }
                ManifestChange::Removed(path) => report_ignored(path.as_path(), WatchEventKind::Removed),
                ManifestChange::Renamed(path) => report_ignored(path.as_path(), WatchEventKind::Renamed),
                ManifestChange::DirectoryRemoved(dir) => {
                    tracing::warn!(dir = %dir.display(), "manifest directory removed, resubscribing");
                    alive = false;
                }
            }
        }

        if written {
            self.rebuild_logged();
        }
        alive
    }

    fn rebuild_logged(&self) {
        if let Err(e) = self.rebuild() {
            tracing::error!("manifest rebuild failed, keeping previous heads: {e}");
        }
    }
}

fn report_ignored(path: &Path, kind: WatchEventKind) {
    let err = Error::WatchEvent {
        path: path.to_path_buf(),
        kind,
    };
    tracing::error!("{err}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config(manifest_path: PathBuf) -> ViteConfig {
        ViteConfig {
            manifest_path,
            base_path: "vite/".to_string(),
            ..ViteConfig::default()
        }
    }

    #[test]
    fn test_dev_mode_bypasses_cache() {
        let vite = Vite::new(ViteConfig {
            dev_mode: true,
            manifest_path: PathBuf::from("/does/not/exist.json"),
            ..ViteConfig::default()
        });

        let heads = vite.get_heads("foo").unwrap();
        assert_eq!(
            &*heads,
            [
                "<script type='module' src='http://localhost:5173/@vite/client'></script>",
                "<script type='module' src='http://localhost:5173/foo'></script>",
            ]
        );
        assert!(vite.rebuild().unwrap().is_noop());
        assert!(vite.cache().is_empty());
    }

    #[test]
    fn test_load_reads_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(
            &path,
            r#"{"main.ts": {"file": "assets/main.js", "isEntry": true}}"#,
        )
        .unwrap();

        let vite = Vite::load(config(path)).unwrap();
        assert_eq!(
            vite.get_heads_string("main.ts").unwrap(),
            "<script type='module' crossorigin src='vite/assets/main.js'></script>"
        );
    }

    #[test]
    fn test_load_missing_manifest_fails() {
        let dir = TempDir::new().unwrap();
        let err = Vite::load(config(dir.path().join("manifest.json"))).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_unknown_entry_is_not_found() {
        let vite = Vite::new(ViteConfig::default());
        assert!(matches!(vite.get_heads("main.ts"), Err(Error::NotFound(_))));
        assert!(vite.get_heads_string("main.ts").is_err());
    }

    #[tokio::test]
    async fn test_watch_returns_immediately_in_dev_mode() {
        let vite = Arc::new(Vite::new(ViteConfig {
            dev_mode: true,
            ..ViteConfig::default()
        }));
        // Not cancelled: only dev mode can make this return.
        vite.watch(CancellationToken::new()).await;
    }
}
