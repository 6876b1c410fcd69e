//! livepoll-poll library - request/response front end
//!
//! Every client interaction is one HTTP call to `/api/game?action=...`.
//! Clients discover state changes by polling the `status` action.

use axum::Router;
use livepoll_common::service::{server_info, ListenPort};
use livepoll_common::SharedSession;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one session store owned by this server
    pub session: SharedSession,
    /// Port the listener is actually bound to, reported by `/api/info`
    pub port: u16,
}

impl AppState {
    /// Create new application state with a fresh session
    pub fn new(port: u16) -> Self {
        Self {
            session: SharedSession::default(),
            port,
        }
    }
}

impl ListenPort for AppState {
    fn listen_port(&self) -> u16 {
        self.port
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{any, get};

    Router::new()
        // Single multiplexed game endpoint, any method
        .route("/api/game", any(api::game_handler))
        .route("/api/info", get(server_info::<AppState>))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
