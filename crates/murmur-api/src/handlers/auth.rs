//! Auth handlers: register, login, OTP send/verify, me.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;
use tracing::info;

use murmur_auth::otp::normalize::is_email;
use murmur_core::error::AppError;
use murmur_core::types::Principal;
use murmur_entity::user::User;

use crate::dto::request::{LoginRequest, RegisterRequest, SendOtpRequest, VerifyOtpRequest};
use crate::dto::response::{ApiResponse, AuthResponse, OtpSentResponse};
use crate::dto::validate;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ClientAddr};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    validate(&req)?;
    let email = req.email.trim().to_lowercase();

    if !state.users.find_by_field("email", &json!(email)).await?.is_empty() {
        return Err(AppError::conflict("Email is already registered").into());
    }

    let mut user = User::new(req.display_name.trim());
    user.email = Some(email);
    user.password_hash = Some(state.password_hasher.hash_password(&req.password)?);
    user.created_at = state.clock.now();
    user.last_login_at = Some(user.created_at);
    let user = state.users.save(user).await?;

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(token_for(&state, user)?))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    validate(&req)?;
    let email = req.email.trim().to_lowercase();
    let invalid = || AppError::authentication("Invalid email or password");

    let mut user = state
        .users
        .find_by_field("email", &json!(email))
        .await?
        .into_iter()
        .next()
        .ok_or_else(invalid)?;

    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !state.password_hasher.verify_password(&req.password, hash)? {
        info!(user_id = %user.id, "Login rejected");
        return Err(invalid().into());
    }

    user.last_login_at = Some(state.clock.now());
    let user = state.users.save(user).await?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(ApiResponse::ok(token_for(&state, user)?)))
}

/// POST /api/auth/otp/send
pub async fn send_otp(
    State(state): State<AppState>,
    ClientAddr(addr): ClientAddr,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<ApiResponse<OtpSentResponse>>, ApiError> {
    validate(&req)?;
    let sent = state.otp.send_code(&req.identifier, &addr).await?;
    Ok(Json(ApiResponse::ok(OtpSentResponse {
        identifier: sent.identifier,
        expires_in: sent.expires_in,
    })))
}

/// POST /api/auth/otp/verify
///
/// A verified identifier signs in its account, creating one on first use.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    validate(&req)?;
    let identifier = state.otp.verify_code(&req.identifier, &req.code)?;

    let field = if is_email(&identifier) { "email" } else { "phone_number" };
    let existing = state
        .users
        .find_by_field(field, &json!(identifier))
        .await?
        .into_iter()
        .next();

    let mut user = match existing {
        Some(user) => user,
        None => {
            let mut user = User::from_identifier(&identifier);
            user.created_at = state.clock.now();
            info!(user_id = %user.id, "Account created from OTP");
            user
        }
    };
    user.verified = true;
    user.last_login_at = Some(state.clock.now());
    let user = state.users.save(user).await?;

    Ok(Json(ApiResponse::ok(token_for(&state, user)?)))
}

/// GET /api/auth/me
pub async fn me(AuthUser(principal): AuthUser) -> Json<ApiResponse<Principal>> {
    Json(ApiResponse::ok(principal))
}

fn token_for(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let issued = state.jwt_encoder.issue(&user.principal())?;
    Ok(AuthResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: user.into(),
    })
}
