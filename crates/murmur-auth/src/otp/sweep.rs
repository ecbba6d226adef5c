//! Periodic memory reclamation for OTP state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info};

use super::service::OtpService;

/// Purge expired challenges and stale rate windows every `interval` until shutdown.
///
/// Verification never depends on this task; it only bounds memory.
pub async fn run_sweep(
    service: Arc<OtpService>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!(interval_secs = interval.as_secs(), "OTP sweep started");
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let purged = service.purge_expired();
                if purged > 0 {
                    debug!(purged, "OTP sweep removed stale entries");
                }
            }
            _ = shutdown.recv() => {
                info!("OTP sweep stopped");
                break;
            }
        }
    }
}
