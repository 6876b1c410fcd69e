//! HTTP API handlers for livepoll-poll

pub mod game;
pub mod health;

pub use game::game_handler;
pub use health::health_routes;
