//! # Livepoll Common Library
//!
//! Shared code for both livepoll front ends:
//! - Session store (the red/green voting state machine)
//! - Event vocabulary and EventBus for push notifications
//! - Configuration resolution
//! - Local network address discovery
//! - Process plumbing (CLI args, tracing, shutdown, `/api/info`)

pub mod config;
pub mod error;
pub mod events;
pub mod netinfo;
pub mod service;
pub mod session;

pub use error::{Error, Result};
pub use session::{SessionPhase, SessionSnapshot, SessionStore, SharedSession, Tally, VoteColor, VoteOutcome};
