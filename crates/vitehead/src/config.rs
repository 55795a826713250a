//! Configuration for the head resolver service.
//!
//! Merges settings from defaults, a `vitehead.toml` file and `VITEHEAD_*`
//! environment variables. Priority: Environment > File > Defaults. Callers
//! (the CLI) apply their own overrides on top of the loaded value.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format as _, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default config file looked up in the working directory.
pub const CONFIG_FILE: &str = "vitehead.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViteConfig {
    /// Location of Vite's `manifest.json`
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    /// URL prefix prepended to every emitted asset path (e.g. `vite/`)
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Directory holding the built assets, served under `base_path`
    #[serde(default = "default_dist_path")]
    pub dist_path: PathBuf,

    /// Point every entry at the dev server instead of built assets
    #[serde(default)]
    pub dev_mode: bool,

    /// Dev server origin, without a trailing slash
    #[serde(default = "default_dev_host")]
    pub dev_host: String,

    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchConfig {
    /// Delay between attempts to subscribe to manifest changes
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Window in which consecutive change events collapse into one rebuild
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: default_retry_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl WatchConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ViteConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            base_path: default_base_path(),
            dist_path: default_dist_path(),
            dev_mode: false,
            dev_host: default_dev_host(),
            watch: WatchConfig::default(),
        }
    }
}

impl ViteConfig {
    /// Load configuration from defaults, a TOML file and the environment.
    ///
    /// With `config_path` set, that file must exist. Without it,
    /// `vitehead.toml` in the working directory is used when present.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        match config_path {
            Some(path) if !path.exists() => {
                return Err(Error::Config {
                    field: "config",
                    hint: format!("config file not found: {}", path.display()),
                });
            }
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                let default_path = Path::new(CONFIG_FILE);
                if default_path.exists() {
                    figment = figment.merge(Toml::file(default_path));
                }
            }
        }

        // VITEHEAD_MANIFEST_PATH, VITEHEAD_DEV_MODE, VITEHEAD_WATCH__DEBOUNCE_MS, ...
        figment = figment.merge(
            Env::prefixed("VITEHEAD_")
                .map(|key| snake_to_camel(&key.as_str().to_ascii_lowercase()).into())
                .split("__")
                .lowercase(false),
        );

        let config: Self = figment.extract().map_err(|e| Error::Config {
            field: "configuration",
            hint: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.dev_mode {
            if self.dev_host.is_empty() {
                return Err(Error::Config {
                    field: "devHost",
                    hint: "dev mode needs the dev server origin, e.g. http://localhost:5173"
                        .to_string(),
                });
            }
            if self.dev_host.ends_with('/') {
                return Err(Error::Config {
                    field: "devHost",
                    hint: format!("remove the trailing '/' from '{}'", self.dev_host),
                });
            }
        } else if self.manifest_path.as_os_str().is_empty() {
            return Err(Error::Config {
                field: "manifestPath",
                hint: "point it at Vite's manifest.json (build.manifest = true)".to_string(),
            });
        }

        if self.watch.retry_interval_ms == 0 {
            return Err(Error::Config {
                field: "watch.retryIntervalMs",
                hint: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// `watch__debounce_ms` -> `watch__debounceMs`, keeping the nesting separator.
fn snake_to_camel(key: &str) -> String {
    key.split("__")
        .map(|segment| {
            let mut out = String::with_capacity(segment.len());
            let mut upper = false;
            for c in segment.chars() {
                if c == '_' {
                    upper = true;
                } else if upper {
                    out.extend(c.to_uppercase());
                    upper = false;
                } else {
                    out.push(c);
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join("__")
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("dist/.vite/manifest.json")
}

fn default_base_path() -> String {
    "vite/".to_string()
}

fn default_dist_path() -> PathBuf {
    PathBuf::from("dist")
}

fn default_dev_host() -> String {
    "http://localhost:5173".to_string()
}

fn default_retry_interval_ms() -> u64 {
    5_000
}

fn default_debounce_ms() -> u64 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ViteConfig::default();
        assert_eq!(config.manifest_path, PathBuf::from("dist/.vite/manifest.json"));
        assert_eq!(config.base_path, "vite/");
        assert!(!config.dev_mode);
        assert_eq!(config.dev_host, "http://localhost:5173");
        assert_eq!(config.watch.retry_interval(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_camel_case_fields() {
        let value = serde_json::to_value(ViteConfig::default()).unwrap();
        assert!(value.get("manifestPath").is_some());
        assert!(value.get("devHost").is_some());
        assert!(value["watch"].get("retryIntervalMs").is_some());
        assert!(value.get("manifest_path").is_none());
    }

    #[test]
    fn test_validate_dev_host() {
        let config = ViteConfig {
            dev_mode: true,
            dev_host: "http://localhost:5173/".to_string(),
            ..ViteConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::Config { field: "devHost", .. })
        ));

        let config = ViteConfig {
            dev_mode: true,
            dev_host: String::new(),
            ..ViteConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_manifest_path_outside_dev_mode() {
        let config = ViteConfig {
            manifest_path: PathBuf::new(),
            ..ViteConfig::default()
        };
        assert!(config.validate().is_err());

        // Dev mode never reads the manifest.
        let config = ViteConfig {
            manifest_path: PathBuf::new(),
            dev_mode: true,
            ..ViteConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("manifest_path"), "manifestPath");
        assert_eq!(snake_to_camel("dev_mode"), "devMode");
        assert_eq!(snake_to_camel("watch__debounce_ms"), "watch__debounceMs");
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vitehead.toml");
        fs::write(
            &path,
            r#"
manifestPath = "public/build/manifest.json"
basePath = "build/"

[watch]
debounceMs = 10
"#,
        )
        .unwrap();

        let config = ViteConfig::load(Some(&path)).unwrap();
        assert_eq!(config.manifest_path, PathBuf::from("public/build/manifest.json"));
        assert_eq!(config.base_path, "build/");
        assert_eq!(config.watch.debounce_ms, 10);
        assert_eq!(config.watch.retry_interval_ms, 5_000);
    }

    #[test]
    #[serial]
    fn test_load_missing_explicit_file() {
        let err = ViteConfig::load(Some(Path::new("/nope/vitehead.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config { field: "config", .. }));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vitehead.toml");
        fs::write(&path, "basePath = \"from-file/\"\n").unwrap();

        unsafe {
            std::env::set_var("VITEHEAD_BASE_PATH", "from-env/");
            std::env::set_var("VITEHEAD_WATCH__DEBOUNCE_MS", "7");
        }
        let config = ViteConfig::load(Some(&path));
        unsafe {
            std::env::remove_var("VITEHEAD_BASE_PATH");
            std::env::remove_var("VITEHEAD_WATCH__DEBOUNCE_MS");
        }

        let config = config.unwrap();
        assert_eq!(config.base_path, "from-env/");
        assert_eq!(config.watch.debounce_ms, 7);
    }
}
