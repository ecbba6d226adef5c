//! Object storage handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use bytes::Bytes;
use tracing::info;

use murmur_core::error::AppError;
use murmur_core::traits::{ObjectMetadata, StoredObject};

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/files
///
/// The raw body is the file. `content-type` and an optional
/// `x-file-name` header describe it.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<StoredObject>>), ApiError> {
    if body.is_empty() {
        return Err(AppError::validation("File body is empty").into());
    }

    let text_header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    };
    let metadata = ObjectMetadata {
        file_name: text_header("x-file-name"),
        content_type: text_header(header::CONTENT_TYPE.as_str()),
    };

    let size = body.len();
    let stored = state.objects.upload(body, metadata).await?;
    info!(user_id = %auth.user_id, public_id = %stored.public_id, size, "File uploaded");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(stored))))
}

/// DELETE /api/files/{public_id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(public_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.objects.delete_by_public_id(&public_id).await? {
        return Err(AppError::not_found(format!("File '{public_id}' not found")).into());
    }
    info!(user_id = %auth.user_id, public_id = %public_id, "File deleted");
    Ok(StatusCode::NO_CONTENT)
}
