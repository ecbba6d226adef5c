//! JWT token validation.

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use murmur_core::config::auth::AuthConfig;
use murmur_core::types::Principal;

use super::claims::Claims;
use super::verifier::{CredentialVerifier, VerifyError};

/// Validates HS256 bearer tokens against the shared secret and issuer.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;
        validation.set_issuer(&[config.jwt_issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a token, returning its claims.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, VerifyError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                JwtErrorKind::ExpiredSignature => VerifyError::Expired,
                JwtErrorKind::InvalidIssuer => VerifyError::IssuerMismatch,
                JwtErrorKind::InvalidSignature => VerifyError::BadSignature,
                JwtErrorKind::InvalidToken | JwtErrorKind::Base64(_) | JwtErrorKind::Json(_) => {
                    VerifyError::Malformed
                }
                _ => VerifyError::Rejected(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }
}

impl CredentialVerifier for JwtDecoder {
    fn verify(&self, token: &str) -> Result<Principal, VerifyError> {
        self.decode_claims(token).map(|claims| claims.principal())
    }
}
