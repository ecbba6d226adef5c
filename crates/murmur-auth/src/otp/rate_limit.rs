//! Fixed-window request counters.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use murmur_core::clock::Clock;

use super::error::RateLimited;

/// Counter state for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitWindow {
    /// The metered key (identifier or client address).
    pub key: String,
    /// When the current window opened.
    pub window_start: DateTime<Utc>,
    /// Requests admitted in the current window.
    pub count: u32,
}

impl RateLimitWindow {
    fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now - self.window_start
    }
}

/// Admits at most `limit` requests per key per fixed window.
///
/// A window opened at `start` covers `[start, start + window)`: the request
/// arriving exactly `window` after it opened starts a fresh window, which
/// is also the instant the retry hint points to. Resets happen as a whole.
/// Reset and increment happen under the key's shard lock, so concurrent
/// requests for one key never observe a half-reset window.
pub struct RateLimiter {
    scope: &'static str,
    limit: u32,
    window: Duration,
    windows: DashMap<String, RateLimitWindow>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("scope", &self.scope)
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("keys", &self.windows.len())
            .finish()
    }
}

impl RateLimiter {
    /// Create a limiter. `scope` names it in errors and logs.
    pub fn new(scope: &'static str, limit: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            scope,
            limit,
            window,
            windows: DashMap::new(),
            clock,
        }
    }

    /// Count one request against `key`, or refuse it.
    pub fn try_acquire(&self, key: &str) -> Result<(), RateLimited> {
        let now = self.clock.now();
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| RateLimitWindow {
                key: key.to_string(),
                window_start: now,
                count: 0,
            });

        if entry.elapsed(now) >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }

        if entry.count >= self.limit {
            return Err(RateLimited {
                scope: self.scope,
                retry_after_seconds: self.retry_after(&entry, now),
            });
        }

        entry.count += 1;
        Ok(())
    }

    /// Seconds until `key` may be admitted again; zero when it may be now.
    pub fn retry_after_seconds(&self, key: &str) -> u64 {
        let now = self.clock.now();
        match self.windows.get(key) {
            Some(w) if w.elapsed(now) < self.window && w.count >= self.limit => {
                self.retry_after(&w, now)
            }
            _ => 0,
        }
    }

    /// Remove windows that have fully elapsed.
    pub fn purge_stale(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows.retain(|_, w| w.elapsed(now) < self.window);
        before.saturating_sub(self.windows.len())
    }

    fn retry_after(&self, window: &RateLimitWindow, now: DateTime<Utc>) -> u64 {
        let remaining = self.window - window.elapsed(now);
        // Round up so a client that waits the hinted time is admitted.
        let millis = remaining.num_milliseconds().max(0) as u64;
        millis.div_ceil(1000).max(1)
    }
}

#[cfg(test)]
mod tests {
    use murmur_core::clock::ManualClock;

    use super::*;

    fn limiter(limit: u32, secs: i64) -> (Arc<ManualClock>, RateLimiter) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let limiter = RateLimiter::new("address", limit, Duration::seconds(secs), clock.clone());
        (clock, limiter)
    }

    #[test]
    fn test_admits_up_to_limit() {
        let (_, limiter) = limiter(5, 60);
        for _ in 0..5 {
            assert!(limiter.try_acquire("10.0.0.1").is_ok());
        }
        let err = limiter.try_acquire("10.0.0.1").unwrap_err();
        assert_eq!(err.scope, "address");
        assert_eq!(err.retry_after_seconds, 60);
    }

    #[test]
    fn test_retry_hint_counts_down() {
        let (clock, limiter) = limiter(1, 60);
        limiter.try_acquire("k").unwrap();
        clock.advance(Duration::milliseconds(45_500));

        assert_eq!(limiter.try_acquire("k").unwrap_err().retry_after_seconds, 15);
        assert_eq!(limiter.retry_after_seconds("k"), 15);
    }

    #[test]
    fn test_window_resets_whole() {
        let (clock, limiter) = limiter(3, 3600);
        for _ in 0..3 {
            limiter.try_acquire("a@b.com").unwrap();
        }
        assert!(limiter.try_acquire("a@b.com").is_err());

        clock.advance(Duration::seconds(3600) - Duration::milliseconds(1));
        assert!(limiter.try_acquire("a@b.com").is_err());

        clock.advance(Duration::milliseconds(1));
        for _ in 0..3 {
            assert!(limiter.try_acquire("a@b.com").is_ok());
        }
        assert!(limiter.try_acquire("a@b.com").is_err());
    }

    #[test]
    fn test_refused_requests_do_not_extend_window() {
        let (clock, limiter) = limiter(1, 60);
        limiter.try_acquire("k").unwrap();
        clock.advance(Duration::seconds(30));
        assert!(limiter.try_acquire("k").is_err());
        clock.advance(Duration::seconds(30));
        assert!(limiter.try_acquire("k").is_ok());
    }

    #[test]
    fn test_keys_independent() {
        let (_, limiter) = limiter(1, 60);
        limiter.try_acquire("a").unwrap();
        assert!(limiter.try_acquire("b").is_ok());
        assert_eq!(limiter.retry_after_seconds("c"), 0);
    }

    #[test]
    fn test_purge_stale() {
        let (clock, limiter) = limiter(1, 60);
        limiter.try_acquire("a").unwrap();
        clock.advance(Duration::seconds(61));
        limiter.try_acquire("b").unwrap();

        assert_eq!(limiter.purge_stale(), 1);
    }
}
