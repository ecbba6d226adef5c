//! # murmur-auth
//!
//! Establishing who a caller is.
//!
//! ## Modules
//!
//! - `jwt`: bearer token issuing and the [`CredentialVerifier`] shared by HTTP and WebSocket paths
//! - `password`: Argon2id password hashing
//! - `otp`: one-time passcode challenges, rate-limit windows, and the delivery service

pub mod jwt;
pub mod otp;
pub mod password;

pub use jwt::{Claims, CredentialVerifier, JwtDecoder, JwtEncoder, VerifyError};
pub use otp::{ChallengeStore, OtpError, OtpService, RateLimited, RateLimiter};
pub use password::PasswordHasher;
