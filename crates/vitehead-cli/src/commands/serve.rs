//! `vitehead serve`: built assets plus a page shell with live heads.
//!
//! The manifest watcher runs for the lifetime of the server, so a new
//! `vite build` shows up on the next page load. Ctrl+C cancels the watcher
//! and shuts the server down gracefully.

use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use vitehead::Vite;

use crate::cli::ServeArgs;
use crate::commands::load_config;
use crate::error::{CliError, Result};
use crate::{server, ui};

pub async fn execute(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path, &args.manifest)?;
    if let Some(dist) = args.dist {
        config.dist_path = dist;
    }

    // A missing or half-written manifest is not fatal: the watcher picks up
    // the next build.
    let vite = match Vite::load(config.clone()) {
        Ok(vite) => vite,
        Err(e) if e.is_decode() => {
            ui::warning(&format!("{e}; waiting for the next build"));
            Vite::new(config)
        }
        Err(e) => return Err(e.into()),
    };
    let vite = Arc::new(vite);

    // Bind first: nothing is running yet if the address is unavailable.
    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| CliError::Server(format!("Failed to bind to {addr}: {e}")))?;
    let local_addr = listener.local_addr()?;

    let cancel = CancellationToken::new();
    let watcher = vite.spawn_watch(cancel.clone());

    let app = server::app(Arc::clone(&vite), args.entry.as_str());

    if vite.is_dev() {
        ui::info(&format!("Dev mode: scripts load from {}", vite.config().dev_host));
    }
    ui::success(&format!("Serving {} at http://{local_addr}/", args.entry));
    ui::info("Press Ctrl+C to stop");

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                ui::info("Shutting down...");
                shutdown.cancel();
            }
            Err(e) => tracing::warn!("cannot listen for Ctrl+C: {e}"),
        }
    });

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .await;

    cancel.cancel();
    if let Err(e) = watcher.await {
        tracing::warn!("manifest watcher task failed: {e}");
    }
    served.map_err(|e| CliError::Server(e.to_string()))?;

    ui::success("Server stopped");
    Ok(())
}
