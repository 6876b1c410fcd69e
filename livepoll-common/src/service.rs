//! Process plumbing shared by both front ends
//!
//! Command-line arguments, tracing setup, shutdown signal handling and the
//! `/api/info` handler. Each binary supplies only its name and router.

use std::path::PathBuf;

use axum::{extract::State, Json};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CliOverrides;
use crate::netinfo::ServerInfo;

/// Command-line arguments common to every livepoll service
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceArgs {
    /// Port to listen on
    #[arg(short, long, env = "LIVEPOLL_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "LIVEPOLL_BIND")]
    pub bind: Option<String>,

    /// TOML config file (default: ./livepoll.toml, then the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl From<ServiceArgs> for CliOverrides {
    fn from(args: ServiceArgs) -> Self {
        Self {
            port: args.port,
            bind_address: args.bind,
            config_file: args.config,
        }
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins; otherwise `target` and livepoll-common log at info,
/// along with tower-http request traces.
pub fn init_tracing(target: &str) {
    let default_filter = format!("{target}=info,livepoll_common=info,tower_http=info");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Graceful shutdown signal handler
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

/// Router state that knows the port its listener is bound to
pub trait ListenPort {
    fn listen_port(&self) -> u16;
}

/// GET /api/info
///
/// Returns `{ip, port, url}` for the first LAN IPv4 address, or `localhost`.
pub async fn server_info<S>(State(state): State<S>) -> Json<ServerInfo>
where
    S: ListenPort + Clone + Send + Sync + 'static,
{
    Json(ServerInfo::discover(state.listen_port()))
}
