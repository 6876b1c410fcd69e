//! livepoll-push library - persistent connection front end
//!
//! Each client holds one WebSocket. Presenter and audience events flow in as
//! JSON frames; state changes are pushed to every connected client.

use axum::Router;
use livepoll_common::service::{server_info, ListenPort};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod hub;
pub mod registry;

use hub::PushHub;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<PushHub>,
    /// Port the listener is actually bound to, reported by `/api/info`
    pub port: u16,
}

impl AppState {
    pub fn new(hub: PushHub, port: u16) -> Self {
        Self {
            hub: Arc::new(hub),
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
    use axum::routing::get;

    Router::new()
        .route("/ws", get(api::ws_handler))
        .route("/api/info", get(server_info::<AppState>))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
