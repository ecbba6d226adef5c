//! Route definitions for the Murmur HTTP API.
//!
//! REST routes are mounted under `/api`; the WebSocket upgrade lives at `/ws`.

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::cors::build_cors_layer;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(presence_routes())
        .merge(private_routes())
        .merge(notification_routes())
        .merge(file_routes())
        .route("/health", get(handlers::health::health));

    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Registration, login, one-time passcodes, and the current principal
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/otp/send", post(handlers::auth::send_otp))
        .route("/auth/otp/verify", post(handlers::auth::verify_otp))
        .route("/auth/me", get(handlers::auth::me))
}

/// Presence and ephemeral room lookups
fn presence_routes() -> Router<AppState> {
    Router::new()
        .route("/presence/{user_id}", get(handlers::presence::get_presence))
        .route("/rooms/{room_id}/members", get(handlers::presence::room_members))
}

/// Private conversation history
fn private_routes() -> Router<AppState> {
    Router::new()
        .route("/private/conversations", get(handlers::private::conversations))
        .route("/private/{user_id}/messages", get(handlers::private::history))
        .route("/private/mark-read/{user_id}", put(handlers::private::mark_read))
}

/// Notification settings, history, and read state
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(handlers::notification::list))
        .route(
            "/notifications/unread-count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/mark-all-read",
            put(handlers::notification::mark_all_read),
        )
        .route("/notifications/{id}/read", put(handlers::notification::mark_read))
        .route(
            "/notifications/settings",
            get(handlers::notification::get_settings).put(handlers::notification::update_settings),
        )
}

/// Object storage
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files", post(handlers::file::upload))
        .route("/files/{public_id}", delete(handlers::file::delete))
}
