//! `vitehead check`: resolve every entry point without serving anything.

use std::path::Path;
use std::time::Instant;

use vitehead::{resolve_heads, Manifest};

use crate::cli::CheckArgs;
use crate::commands::load_config;
use crate::error::{CliError, Result};
use crate::ui;

/// Decode the manifest and resolve each `isEntry` key.
///
/// Prints one line per entry point and fails if any of them does not
/// resolve.
pub async fn execute(args: CheckArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path, &args.manifest)?;
    config.validate()?;

    if config.dev_mode {
        ui::warning("Dev mode is enabled; the manifest is only used for production builds");
    }

    ui::info(&format!("Checking {}", config.manifest_path.display()));
    let started = Instant::now();

    let manifest = Manifest::from_path(&config.manifest_path)?;
    let entrypoints: Vec<&str> = manifest.entrypoints().map(|(key, _)| key).collect();
    if entrypoints.is_empty() {
        ui::warning(&format!(
            "No entry points among {} manifest entries",
            manifest.len()
        ));
        return Ok(());
    }

    let mut failed = 0;
    for key in &entrypoints {
        match resolve_heads(&manifest, key, &config.base_path) {
            Ok(heads) => ui::success(&format!("{key} ({} tags)", heads.len())),
            Err(e) => {
                failed += 1;
                ui::error(&format!("{key}: {e}"));
            }
        }
    }

    let total = entrypoints.len();
    if failed > 0 {
        return Err(CliError::CheckFailed { failed, total });
    }

    ui::success(&format!(
        "{total} entry points resolved in {}",
        ui::format_duration(started.elapsed().as_millis() as u64)
    ));
    Ok(())
}
