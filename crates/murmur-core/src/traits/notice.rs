//! Outbound email/SMS notice trait.

use async_trait::async_trait;

use crate::result::AppResult;

/// Delivers a short text to an email address or phone number.
///
/// Callers never retry; a failure is surfaced as-is.
#[async_trait]
pub trait NoticeSender: Send + Sync + std::fmt::Debug + 'static {
    /// Send `message` to `identifier`.
    async fn send(&self, identifier: &str, message: &str) -> AppResult<()>;
}
