//! `vitehead heads`: print the head tags for one entry point.

use std::path::Path;

use vitehead::Vite;

use crate::cli::HeadsArgs;
use crate::commands::load_config;
use crate::error::Result;

/// Print the joined head fragments of `args.entry` to stdout.
pub async fn execute(args: HeadsArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path, &args.manifest)?;
    if let Some(dev_host) = args.dev_host {
        config.dev_host = dev_host;
        config.dev_mode = true;
    }
    if args.dev {
        config.dev_mode = true;
    }

    let vite = Vite::load(config)?;
    let heads = vite.get_heads_string(&args.entry)?;
    println!("{heads}");
    Ok(())
}
