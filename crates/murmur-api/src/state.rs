//! Application state shared across all handlers and extractors.

use std::sync::Arc;

use murmur_auth::jwt::{CredentialVerifier, JwtEncoder};
use murmur_auth::otp::OtpService;
use murmur_auth::password::PasswordHasher;
use murmur_core::clock::Clock;
use murmur_core::config::AppConfig;
use murmur_core::traits::{ObjectStore, Repository};
use murmur_core::types::UserId;
use murmur_entity::user::User;
use murmur_realtime::server::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Time source shared with the engine and OTP service
    pub clock: Arc<dyn Clock>,

    // ── Auth ─────────────────────────────────────────────────
    /// Bearer token encoder
    pub jwt_encoder: Arc<JwtEncoder>,
    /// Bearer token verifier, shared with the WebSocket handshake
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Password hasher (Argon2)
    pub password_hasher: Arc<PasswordHasher>,
    /// One-time passcode service
    pub otp: Arc<OtpService>,

    // ── Realtime ─────────────────────────────────────────────
    /// WebSocket realtime engine
    pub realtime: Arc<RealtimeEngine>,

    // ── Collaborators ────────────────────────────────────────
    /// User profiles
    pub users: Arc<dyn Repository<User, UserId>>,
    /// Binary object storage
    pub objects: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("realtime", &self.realtime)
            .field("objects", &self.objects)
            .finish()
    }
}
