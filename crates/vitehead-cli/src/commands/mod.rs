//! Command implementations.

mod check;
mod heads;
mod serve;

use std::path::Path;

use vitehead::ViteConfig;

use crate::cli::ManifestArgs;
use crate::error::Result;

pub use check::execute as check_execute;
pub use heads::execute as heads_execute;
pub use serve::execute as serve_execute;

/// Load `vitehead.toml` and the environment, then apply CLI overrides.
///
/// The result is not validated; commands validate after their own overrides.
pub(crate) fn load_config(config_path: Option<&Path>, args: &ManifestArgs) -> Result<ViteConfig> {
    let mut config = ViteConfig::load(config_path)?;
    if let Some(manifest) = &args.manifest {
        config.manifest_path = manifest.clone();
    }
    if let Some(base) = &args.base {
        config.base_path = base.clone();
    }
    Ok(config)
}
