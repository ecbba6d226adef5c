//! Private conversation history.

use axum::Json;
use axum::extract::{Path, Query, State};

use murmur_core::types::UserId;
use murmur_entity::message::ChatMessage;

use crate::dto::response::{ApiResponse, ConversationResponse, CountResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /api/private/{user_id}/messages
///
/// Page 1 holds the newest messages; each page is oldest first.
pub async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(peer_id): Path<UserId>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, ApiError> {
    let messages = state
        .realtime
        .chat
        .history(auth.user_id, peer_id, params.index(), params.size())
        .await?;
    Ok(Json(ApiResponse::ok(messages)))
}

/// GET /api/private/conversations
pub async fn conversations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ConversationResponse>>>, ApiError> {
    let summaries = state.realtime.chat.conversations(auth.user_id).await?;

    let mut conversations = Vec::with_capacity(summaries.len());
    for summary in summaries {
        let peer_name = state
            .users
            .find_by_id(&summary.peer_id)
            .await?
            .map(|u| u.display_name);
        conversations.push(ConversationResponse {
            peer_id: summary.peer_id,
            peer_name,
            peer_online: summary.peer_online,
            unread_count: summary.unread_count,
            last_message: summary.last_message,
        });
    }
    Ok(Json(ApiResponse::ok(conversations)))
}

/// PUT /api/private/mark-read/{user_id}
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(peer_id): Path<UserId>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state
        .realtime
        .chat
        .mark_conversation_read(&auth, peer_id)
        .await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}
