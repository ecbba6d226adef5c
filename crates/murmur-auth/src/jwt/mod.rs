//! Bearer token encoding, verification, and claims.

pub mod claims;
pub mod decoder;
pub mod encoder;
pub mod verifier;

pub use claims::Claims;
pub use decoder::JwtDecoder;
pub use encoder::{IssuedToken, JwtEncoder};
pub use verifier::{CredentialVerifier, VerifyError, bearer_token};
