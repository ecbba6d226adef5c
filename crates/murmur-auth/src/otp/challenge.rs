//! The OTP challenge record.

use chrono::{DateTime, Utc};

/// One outstanding verification window for an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    /// Normalised email or phone number.
    pub identifier: String,
    /// Six ASCII digits.
    pub code: String,
    /// When the code was issued.
    pub created_at: DateTime<Utc>,
    /// Last instant at which the code still verifies.
    pub expires_at: DateTime<Utc>,
    /// Failed verifications so far.
    pub attempt_count: u32,
}

impl OtpChallenge {
    /// Whether the challenge has lapsed at `now`, i.e. `now` is after `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Compare `candidate` to the stored code without short-circuiting on the first differing byte.
    pub fn matches(&self, candidate: &str) -> bool {
        let (a, b) = (self.code.as_bytes(), candidate.as_bytes());
        a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}
