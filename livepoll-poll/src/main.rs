//! livepoll-poll - Main entry point
//!
//! Request/response front end for the live red/green audience poll.
//! Presenter and audience pages poll `/api/game?action=status`.

use anyhow::{Context, Result};
use clap::Parser;
use livepoll_common::config::ConfigResolver;
use livepoll_common::service::{init_tracing, shutdown_signal, ServiceArgs};
use livepoll_poll::{build_router, AppState};
use tracing::info;

/// Command-line arguments for livepoll-poll
#[derive(Parser, Debug)]
#[command(name = "livepoll-poll")]
#[command(about = "Live audience poll server (HTTP polling)")]
#[command(version)]
struct Args {
    #[command(flatten)]
    service: ServiceArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("livepoll_poll");

    info!("Starting livepoll-poll v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = ConfigResolver::new("livepoll-poll").resolve(&args.service.into());

    let address = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {address}"))?;
    let port = listener
        .local_addr()
        .context("Failed to read bound address")?
        .port();

    info!("Server running on http://localhost:{}", port);
    info!("Game endpoint:   http://localhost:{}/api/game?action=status", port);

    let app = build_router(AppState::new(port));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}
