//! Notification settings and history.

use axum::Json;
use axum::extract::{Path, State};
use chrono::NaiveTime;

use murmur_core::error::AppError;
use murmur_core::types::NotificationId;
use murmur_entity::notification::{Notification, NotificationSettings};

use crate::dto::request::UpdateNotificationSettingsRequest;
use crate::dto::response::{ApiResponse, CountResponse};
use crate::dto::validate;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/notifications
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<Notification>>>, ApiError> {
    let items = state.realtime.notifications.list(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(items)))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.realtime.notifications.unread_count(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    let notification = state.realtime.notifications.mark_read(auth.user_id, id).await?;
    Ok(Json(ApiResponse::ok(notification)))
}

/// PUT /api/notifications/mark-all-read
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.realtime.notifications.mark_all_read(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// GET /api/notifications/settings
pub async fn get_settings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<NotificationSettings>>, ApiError> {
    let settings = state.realtime.settings.get_or_create(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(settings)))
}

/// PUT /api/notifications/settings
pub async fn update_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateNotificationSettingsRequest>,
) -> Result<Json<ApiResponse<NotificationSettings>>, ApiError> {
    validate(&req)?;
    let mut settings = state.realtime.settings.get_or_create(auth.user_id).await?;

    if let Some(v) = req.message_enabled {
        settings.message_enabled = v;
    }
    if let Some(v) = req.mention_enabled {
        settings.mention_enabled = v;
    }
    if let Some(v) = req.file_enabled {
        settings.file_enabled = v;
    }
    if let Some(v) = req.group_invite_enabled {
        settings.group_invite_enabled = v;
    }
    if let Some(v) = req.dnd_enabled {
        settings.dnd_enabled = v;
    }
    if let Some(v) = req.dnd_start.as_deref() {
        settings.dnd_start = parse_time("dnd_start", v)?;
    }
    if let Some(v) = req.dnd_end.as_deref() {
        settings.dnd_end = parse_time("dnd_end", v)?;
    }
    if let Some(v) = req.dnd_utc_offset_minutes {
        settings.dnd_utc_offset_minutes = v;
    }
    if let Some(v) = req.muted_chat_ids {
        settings.muted_chat_ids = v;
    }
    if let Some(v) = req.sound_enabled {
        settings.sound_enabled = v;
    }

    let saved = state.realtime.settings.update(auth.user_id, settings).await?;
    Ok(Json(ApiResponse::ok(saved)))
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| AppError::validation(format!("{field} must be HH:MM")))
}
