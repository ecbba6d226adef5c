//! Application builder. Wires collaborators, the realtime engine, and the
//! router into a runnable server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tracing::{error, info, warn};

use murmur_auth::jwt::{JwtDecoder, JwtEncoder};
use murmur_auth::otp::{OtpService, TracingNoticeSender, run_sweep};
use murmur_auth::password::PasswordHasher;
use murmur_core::clock::{Clock, SystemClock};
use murmur_core::config::AppConfig;
use murmur_core::error::AppError;
use murmur_core::traits::NoticeSender;
use murmur_entity::message::ChatMessage;
use murmur_entity::notification::{Notification, NotificationSettings};
use murmur_entity::user::User;
use murmur_realtime::server::{EngineStores, RealtimeEngine};
use murmur_store::{MemoryObjectStore, MemoryRepository};

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Assemble the application state over in-process collaborators.
pub fn build_state(
    config: AppConfig,
    notices: Arc<dyn NoticeSender>,
    clock: Arc<dyn Clock>,
) -> AppState {
    let users = Arc::new(MemoryRepository::<User>::new());
    let stores = EngineStores {
        users: users.clone(),
        messages: Arc::new(MemoryRepository::<ChatMessage>::new()),
        notifications: Arc::new(MemoryRepository::<Notification>::new()),
        settings: Arc::new(MemoryRepository::<NotificationSettings>::new()),
    };

    let jwt_encoder = Arc::new(JwtEncoder::new(&config.auth));
    let verifier = Arc::new(JwtDecoder::new(&config.auth));
    let otp = Arc::new(OtpService::new(&config.otp, clock.clone(), notices));

    let realtime = Arc::new(RealtimeEngine::new(
        config.realtime.clone(),
        verifier.clone(),
        stores,
        clock.clone(),
    ));

    let objects = Arc::new(MemoryObjectStore::new(format!(
        "http://{}:{}/objects",
        config.server.host, config.server.port
    )));

    AppState {
        config: Arc::new(config),
        clock,
        jwt_encoder,
        verifier,
        password_hasher: Arc::new(PasswordHasher::new()),
        otp,
        realtime,
        users,
        objects,
    }
}

/// Runs the Murmur server until Ctrl+C.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    info!("Starting Murmur server...");

    let state = build_state(
        config.clone(),
        Arc::new(TracingNoticeSender),
        Arc::new(SystemClock),
    );

    let forwarder = state.realtime.spawn_presence_forwarder();

    if config.otp.sweep_interval_seconds > 0 {
        tokio::spawn(run_sweep(
            state.otp.clone(),
            Duration::from_secs(config.otp.sweep_interval_seconds),
            state.realtime.shutdown_receiver(),
        ));
    }

    let app = build_app(state.clone());
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!(addr = %addr, "Murmur server listening");

    let realtime = state.realtime.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        realtime.shutdown();
    })
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    drain_connections(&state.realtime, Duration::from_secs(config.server.shutdown_grace_seconds)).await;
    if let Err(e) = forwarder.await {
        warn!(error = %e, "Presence forwarder ended abnormally");
    }

    info!("Murmur server stopped");
    Ok(())
}

/// Wait for WebSocket tasks to release their connections, up to `grace`.
async fn drain_connections(realtime: &RealtimeEngine, grace: Duration) {
    let deadline = tokio::time::Instant::now() + grace;
    while realtime.connections.connection_count() > 0 {
        if tokio::time::Instant::now() >= deadline {
            warn!(
                remaining = realtime.connections.connection_count(),
                "Shutdown grace period elapsed with open connections"
            );
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
