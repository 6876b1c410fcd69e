//! HTTP API handlers for livepoll-push

pub mod health;
pub mod ws;

pub use health::health_routes;
pub use ws::ws_handler;
