//! The OTP challenge store.

use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use tracing::debug;

use murmur_core::clock::Clock;
use murmur_core::config::otp::OtpConfig;

use super::challenge::OtpChallenge;
use super::error::OtpError;

/// Holds at most one active challenge per identifier.
///
/// Every operation on an identifier runs under that key's shard lock, so
/// issue/verify races on the same identifier are serialized while
/// unrelated identifiers proceed in parallel. Expiry is checked when a
/// challenge is read; [`purge_expired`](Self::purge_expired) only reclaims
/// memory.
pub struct ChallengeStore {
    challenges: DashMap<String, OtpChallenge>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    max_attempts: u32,
}

impl std::fmt::Debug for ChallengeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeStore")
            .field("active", &self.challenges.len())
            .field("ttl", &self.ttl)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl ChallengeStore {
    /// Create a store whose codes live for `ttl` and tolerate `max_attempts` misses.
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration, max_attempts: u32) -> Self {
        Self {
            challenges: DashMap::new(),
            clock,
            ttl,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Create a store from configuration.
    pub fn from_config(config: &OtpConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            clock,
            Duration::seconds(config.code_ttl_seconds as i64),
            config.max_attempts,
        )
    }

    /// Code lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh code for `identifier`, replacing any existing challenge.
    pub fn issue(&self, identifier: &str) -> String {
        let code = rand::rng().random_range(100_000..=999_999u32).to_string();
        let now = self.clock.now();

        self.challenges.insert(
            identifier.to_string(),
            OtpChallenge {
                identifier: identifier.to_string(),
                code: code.clone(),
                created_at: now,
                expires_at: now + self.ttl,
                attempt_count: 0,
            },
        );

        debug!(identifier, "OTP challenge issued");
        code
    }

    /// Check `code` against the challenge for `identifier`.
    ///
    /// The challenge is removed on success and on every terminal failure; a
    /// mismatch increments the attempt count and removes the challenge once
    /// the count reaches the maximum.
    pub fn verify(&self, identifier: &str, code: &str) -> Result<(), OtpError> {
        let Entry::Occupied(mut entry) = self.challenges.entry(identifier.to_string()) else {
            return Err(OtpError::NotFound);
        };

        if entry.get().is_expired(self.clock.now()) {
            entry.remove();
            return Err(OtpError::Expired);
        }

        if entry.get().attempt_count >= self.max_attempts {
            entry.remove();
            return Err(OtpError::AttemptsExceeded);
        }

        if entry.get().matches(code) {
            entry.remove();
            debug!(identifier, "OTP verified");
            return Ok(());
        }

        let challenge = entry.get_mut();
        challenge.attempt_count += 1;
        let remaining_attempts = self.max_attempts - challenge.attempt_count;
        if remaining_attempts == 0 {
            entry.remove();
        }

        debug!(identifier, remaining_attempts, "OTP mismatch");
        Err(OtpError::Mismatch { remaining_attempts })
    }

    /// Drop the challenge for `identifier`, if any.
    pub fn invalidate(&self, identifier: &str) -> bool {
        self.challenges.remove(identifier).is_some()
    }

    /// Whether a live challenge exists. An expired one is removed.
    pub fn has_valid_challenge(&self, identifier: &str) -> bool {
        let now = self.clock.now();
        // remove_if holds the shard lock across the check and the removal.
        self.challenges
            .remove_if(identifier, |_, c| c.is_expired(now))
            .is_none()
            && self.challenges.contains_key(identifier)
    }

    /// Remove every expired challenge. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.challenges.len();
        self.challenges.retain(|_, c| !c.is_expired(now));
        before.saturating_sub(self.challenges.len())
    }

    /// Number of stored challenges, expired ones included.
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    /// Whether the store holds no challenges.
    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}
