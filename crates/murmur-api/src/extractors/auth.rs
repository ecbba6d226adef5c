//! `AuthUser` extractor. Pulls the bearer token from the Authorization
//! header and resolves it with the same verifier the WebSocket handshake uses.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use murmur_auth::jwt::bearer_token;
use murmur_core::error::AppError;
use murmur_core::types::Principal;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl std::ops::Deref for AuthUser {
    type Target = Principal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

        let token = bearer_token(header)
            .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?;

        let principal = state.verifier.verify(token).map_err(AppError::from)?;
        Ok(AuthUser(principal))
    }
}
