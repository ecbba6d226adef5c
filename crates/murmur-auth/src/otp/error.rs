//! OTP error types.

use thiserror::Error;

use murmur_core::error::AppError;

/// Outcome of a failed [`verify`](super::ChallengeStore::verify).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    /// No challenge exists for the identifier.
    #[error("no active code for this identifier")]
    NotFound,
    /// The challenge lapsed; it has been removed.
    #[error("code has expired")]
    Expired,
    /// The challenge had no attempts left; it has been removed.
    #[error("too many failed attempts")]
    AttemptsExceeded,
    /// Wrong code. When `remaining_attempts` is zero the challenge is gone.
    #[error("incorrect code, {remaining_attempts} attempt(s) left")]
    Mismatch {
        /// Attempts still allowed against this challenge.
        remaining_attempts: u32,
    },
}

impl OtpError {
    /// Whether the caller has to request a new code.
    pub fn requires_reissue(&self) -> bool {
        !matches!(self, Self::Mismatch { remaining_attempts } if *remaining_attempts > 0)
    }
}

impl From<OtpError> for AppError {
    fn from(err: OtpError) -> Self {
        if err.requires_reissue() {
            AppError::challenge_expired_or_exhausted(format!(
                "{err}; request a new code"
            ))
        } else {
            AppError::authentication(err.to_string())
        }
    }
}

/// A rate-limit window is full.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{scope} limit reached, retry in {retry_after_seconds}s")]
pub struct RateLimited {
    /// Which limiter refused (`identifier` or `address`).
    pub scope: &'static str,
    /// Seconds until the window resets.
    pub retry_after_seconds: u64,
}

impl From<RateLimited> for AppError {
    fn from(err: RateLimited) -> Self {
        AppError::rate_limited(
            format!("Too many code requests ({})", err.scope),
            err.retry_after_seconds,
        )
    }
}
