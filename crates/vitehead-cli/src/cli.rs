//! Command-line interface definition.
//!
//! - `vitehead heads` - print the head tags for one entry point
//! - `vitehead check` - resolve every entry point in the manifest
//! - `vitehead serve` - serve built assets and a page shell with live heads

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// vitehead - Vite manifest to HTML head tags
#[derive(Parser, Debug)]
#[command(
    name = "vitehead",
    version,
    about = "Resolve Vite manifest entry points into HTML head tags",
    long_about = "vitehead reads the manifest.json produced by `vite build` and prints the\n\
                  <script> and <link> tags a server-rendered page needs for an entry point.\n\
                  In dev mode it points at the Vite dev server instead."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to vitehead.toml
    ///
    /// Without it, vitehead.toml in the current directory is used when present.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the head tags for an entry point
    Heads(HeadsArgs),

    /// Resolve every entry point in the manifest and report failures
    Check(CheckArgs),

    /// Serve built assets plus an HTML shell for an entry point
    Serve(ServeArgs),
}

/// Overrides shared by every command that reads the manifest.
#[derive(Args, Debug, Clone, Default)]
pub struct ManifestArgs {
    /// Path to manifest.json (overrides manifestPath)
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Prefix for emitted asset URLs (overrides basePath)
    #[arg(short, long, value_name = "PREFIX")]
    pub base: Option<String>,
}

#[derive(Args, Debug)]
pub struct HeadsArgs {
    /// Manifest key of the entry point, e.g. src/main.ts
    #[arg(value_name = "ENTRY")]
    pub entry: String,

    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Point at the Vite dev server instead of built assets
    #[arg(long)]
    pub dev: bool,

    /// Dev server origin without trailing slash (implies --dev)
    #[arg(long, value_name = "URL")]
    pub dev_host: Option<String>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Manifest key of the entry point rendered by the page shell
    #[arg(value_name = "ENTRY")]
    pub entry: String,

    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Directory holding the built assets (overrides distPath)
    #[arg(short, long, value_name = "DIR")]
    pub dist: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}
