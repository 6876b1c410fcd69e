//! livepoll-push - Main entry point
//!
//! WebSocket front end for the live red/green audience poll.
//! Presenter and audience pages keep one socket open on `/ws`.

use anyhow::{Context, Result};
use clap::Parser;
use livepoll_common::config::ConfigResolver;
use livepoll_common::service::{init_tracing, shutdown_signal, ServiceArgs};
use livepoll_push::hub::PushHub;
use livepoll_push::{build_router, AppState};
use tracing::info;

/// Command-line arguments for livepoll-push
#[derive(Parser, Debug)]
#[command(name = "livepoll-push")]
#[command(about = "Live audience poll server (WebSocket push)")]
#[command(version)]
struct Args {
    #[command(flatten)]
    service: ServiceArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("livepoll_push");

    info!("Starting livepoll-push v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = ConfigResolver::new("livepoll-push").resolve(&args.service.into());

    let address = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {address}"))?;
    let port = listener
        .local_addr()
        .context("Failed to read bound address")?
        .port();

    info!("Server running on http://localhost:{}", port);
    info!("Event channel:   ws://localhost:{}/ws", port);

    let hub = PushHub::new(config.event_capacity);
    let app = build_router(AppState::new(hub, port));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}
