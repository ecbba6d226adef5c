//! OTP issuance and verification with rate limiting and delivery.

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tracing::{info, warn};

use murmur_core::clock::Clock;
use murmur_core::config::otp::OtpConfig;
use murmur_core::error::{AppError, ErrorKind};
use murmur_core::result::AppResult;
use murmur_core::traits::NoticeSender;

use super::normalize::normalize_identifier;
use super::rate_limit::RateLimiter;
use super::store::ChallengeStore;

/// Confirmation that a code went out.
#[derive(Debug, Clone, Serialize)]
pub struct SentCode {
    /// The identifier in canonical form.
    pub identifier: String,
    /// Seconds until the code lapses.
    pub expires_in: u64,
}

/// Issues codes to identifiers and checks them.
#[derive(Debug)]
pub struct OtpService {
    store: ChallengeStore,
    identifier_limiter: RateLimiter,
    address_limiter: RateLimiter,
    notices: Arc<dyn NoticeSender>,
}

impl OtpService {
    /// Build the service and its limiters from configuration.
    pub fn new(config: &OtpConfig, clock: Arc<dyn Clock>, notices: Arc<dyn NoticeSender>) -> Self {
        Self {
            store: ChallengeStore::from_config(config, clock.clone()),
            identifier_limiter: RateLimiter::new(
                "identifier",
                config.identifier_limit,
                Duration::seconds(config.identifier_window_seconds as i64),
                clock.clone(),
            ),
            address_limiter: RateLimiter::new(
                "address",
                config.address_limit,
                Duration::seconds(config.address_window_seconds as i64),
                clock,
            ),
            notices,
        }
    }

    /// Meter, issue, and deliver a code.
    ///
    /// Quota is consumed when the request is admitted, whether or not
    /// delivery then succeeds. A delivery failure discards the new
    /// challenge and is returned as-is; nothing is retried.
    pub async fn send_code(&self, identifier: &str, client_address: &str) -> AppResult<SentCode> {
        let identifier = normalize_identifier(identifier)?;

        self.address_limiter.try_acquire(client_address)?;
        self.identifier_limiter.try_acquire(&identifier)?;

        let code = self.store.issue(&identifier);
        let ttl = self.store.ttl();
        let message = format!(
            "Your verification code is {code}. It expires in {} minutes.",
            ttl.num_minutes().max(1)
        );

        if let Err(e) = self.notices.send(&identifier, &message).await {
            self.store.invalidate(&identifier);
            warn!(identifier = %identifier, error = %e, "OTP delivery failed");
            return Err(match e.kind {
                ErrorKind::ExternalService => e,
                _ => AppError::with_source(
                    ErrorKind::ExternalService,
                    "Failed to deliver verification code",
                    e,
                ),
            });
        }

        info!(identifier = %identifier, "OTP sent");
        Ok(SentCode {
            identifier,
            expires_in: ttl.num_seconds().max(0) as u64,
        })
    }

    /// Check a code. Returns the canonical identifier on success.
    pub fn verify_code(&self, identifier: &str, code: &str) -> AppResult<String> {
        let identifier = normalize_identifier(identifier)?;
        self.store.verify(&identifier, code.trim())?;
        Ok(identifier)
    }

    /// Discard any outstanding code for `identifier`.
    pub fn invalidate(&self, identifier: &str) -> AppResult<bool> {
        Ok(self.store.invalidate(&normalize_identifier(identifier)?))
    }

    /// Whether `identifier` has a code that would still verify.
    pub fn has_valid_challenge(&self, identifier: &str) -> AppResult<bool> {
        Ok(self
            .store
            .has_valid_challenge(&normalize_identifier(identifier)?))
    }

    /// Drop expired challenges and elapsed rate windows.
    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
            + self.identifier_limiter.purge_stale()
            + self.address_limiter.purge_stale()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use murmur_core::clock::ManualClock;

    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingSender {
        fn last_code(&self) -> String {
            let sent = self.sent.lock().unwrap();
            let (_, message) = sent.last().unwrap();
            message
                .split_whitespace()
                .find(|w| w.trim_end_matches('.').len() == 6 && w.chars().take(6).all(|c| c.is_ascii_digit()))
                .unwrap()
                .trim_end_matches('.')
                .to_string()
        }
    }

    #[async_trait]
    impl NoticeSender for RecordingSender {
        async fn send(&self, identifier: &str, message: &str) -> AppResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((identifier.to_string(), message.to_string()));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingSender;

    #[async_trait]
    impl NoticeSender for FailingSender {
        async fn send(&self, _: &str, _: &str) -> AppResult<()> {
            Err(AppError::internal("smtp down"))
        }
    }

    fn service(notices: Arc<dyn NoticeSender>) -> (Arc<ManualClock>, OtpService) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = OtpService::new(&OtpConfig::default(), clock.clone(), notices);
        (clock, service)
    }

    #[tokio::test]
    async fn test_send_then_verify() {
        let sender = Arc::new(RecordingSender::default());
        let (_, service) = service(sender.clone());

        let sent = service.send_code(" A@B.com ", "10.0.0.1").await.unwrap();
        assert_eq!(sent.identifier, "a@b.com");
        assert_eq!(sent.expires_in, 120);

        let code = sender.last_code();
        assert_eq!(service.verify_code("a@b.com", &code).unwrap(), "a@b.com");
        assert_eq!(
            service.verify_code("a@b.com", &code).unwrap_err().kind,
            ErrorKind::ChallengeExpiredOrExhausted
        );
    }

    #[tokio::test]
    async fn test_identifier_limit() {
        let (_, service) = service(Arc::new(RecordingSender::default()));

        for i in 0..3 {
            service
                .send_code("a@b.com", &format!("10.0.0.{i}"))
                .await
                .unwrap();
        }
        let err = service.send_code("a@b.com", "10.0.0.9").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimited);
        assert_eq!(err.retry_after_seconds, Some(3600));
    }

    #[tokio::test]
    async fn test_address_limit_resets_after_window() {
        let (clock, service) = service(Arc::new(RecordingSender::default()));

        for i in 0..5 {
            service
                .send_code(&format!("u{i}@b.com"), "10.0.0.1")
                .await
                .unwrap();
        }
        let err = service.send_code("u9@b.com", "10.0.0.1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimited);

        clock.advance(Duration::seconds(60));
        assert!(service.send_code("u9@b.com", "10.0.0.1").await.is_ok());
    }

    #[tokio::test]
    async fn test_delivery_failure_discards_challenge() {
        let (_, service) = service(Arc::new(FailingSender));

        let err = service.send_code("a@b.com", "10.0.0.1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalService);
        assert!(!service.has_valid_challenge("a@b.com").unwrap());
    }

    #[tokio::test]
    async fn test_expired_code_requires_reissue() {
        let sender = Arc::new(RecordingSender::default());
        let (clock, service) = service(sender.clone());
        service.send_code("+91 98765 43210", "10.0.0.1").await.unwrap();
        let code = sender.last_code();

        clock.advance(Duration::seconds(121));
        let err = service.verify_code("9876543210", &code).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ChallengeExpiredOrExhausted);
    }
}
