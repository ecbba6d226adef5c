//! Development notice sender.

use async_trait::async_trait;
use tracing::info;

use murmur_core::result::AppResult;
use murmur_core::traits::NoticeSender;

/// Writes notices to the log instead of delivering them.
///
/// This is the only place a code may appear in logs; wire a real email/SMS
/// provider in production.
#[derive(Debug, Clone, Default)]
pub struct TracingNoticeSender;

#[async_trait]
impl NoticeSender for TracingNoticeSender {
    async fn send(&self, identifier: &str, message: &str) -> AppResult<()> {
        info!(identifier, message, "Notice (not delivered, development sender)");
        Ok(())
    }
}
