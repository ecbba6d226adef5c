//! Presence and room lookups.

use axum::Json;
use axum::extract::{Path, State};

use murmur_core::types::{RoomId, UserId};

use crate::dto::response::{ApiResponse, PresenceResponse, RoomMembersResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/presence/{user_id}
///
/// Live state comes from the tracker; `last_seen_at` falls back to the
/// stored profile for users who have not connected since startup.
pub async fn get_presence(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<ApiResponse<PresenceResponse>>, ApiError> {
    let record = state.realtime.presence.get(&user_id);

    let last_seen_at = match record.last_seen_at {
        Some(at) => Some(at),
        None if !record.online => state
            .users
            .find_by_id(&user_id)
            .await?
            .and_then(|u| u.last_seen_at),
        None => None,
    };

    Ok(Json(ApiResponse::ok(PresenceResponse {
        user_id,
        online: record.online,
        active_connections: record.active_connection_count,
        last_seen_at,
    })))
}

/// GET /api/rooms/{room_id}/members
pub async fn room_members(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(room_id): Path<String>,
) -> Json<ApiResponse<RoomMembersResponse>> {
    let room_id = RoomId::from(room_id);
    let members = state.realtime.presence.room_members(&room_id);
    Json(ApiResponse::ok(RoomMembersResponse { room_id, members }))
}
