//! The credential verification seam.

use thiserror::Error;

use murmur_core::error::AppError;
use murmur_core::types::Principal;

/// Why a bearer token was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Not a structurally valid token.
    #[error("malformed token")]
    Malformed,
    /// Signature does not match the shared secret.
    #[error("invalid token signature")]
    BadSignature,
    /// Issued by someone else.
    #[error("token issuer mismatch")]
    IssuerMismatch,
    /// Past its expiry.
    #[error("token has expired")]
    Expired,
    /// Any other validation failure.
    #[error("token rejected: {0}")]
    Rejected(String),
}

impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        AppError::authentication(err.to_string())
    }
}

/// Resolves a bearer token to a [`Principal`].
///
/// Stateless and side-effect free. The HTTP extractor and the WebSocket
/// authenticator hold the same instance, so a token resolves to the same
/// principal on both paths.
pub trait CredentialVerifier: Send + Sync + std::fmt::Debug + 'static {
    /// Verify `token` and return the identity it carries.
    fn verify(&self, token: &str) -> Result<Principal, VerifyError>;
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
