//! vitehead CLI - print, check and serve the head tags of a Vite build.
//!
//! Parses arguments, sets up logging, dispatches to a command and renders any
//! error as a miette diagnostic.

use clap::Parser;
use miette::Result;
use vitehead_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);
    ui::set_quiet(args.quiet);

    let config = args.config.as_deref();
    let result = match args.command {
        cli::Command::Heads(heads_args) => commands::heads_execute(heads_args, config).await,
        cli::Command::Check(check_args) => commands::check_execute(check_args, config).await,
        cli::Command::Serve(serve_args) => commands::serve_execute(serve_args, config).await,
    };

    result.map_err(error::cli_error_to_miette)
}
