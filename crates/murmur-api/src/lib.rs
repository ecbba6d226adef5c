//! # murmur-api
//!
//! HTTP API layer for Murmur built on Axum.
//!
//! Provides the account endpoints (register, login, OTP), presence and
//! room lookups, notification settings, file uploads, health, and the
//! WebSocket upgrade that hands connections to the realtime engine.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state};
pub use error::ApiError;
pub use state::AppState;
