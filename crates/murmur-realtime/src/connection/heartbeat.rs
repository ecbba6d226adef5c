//! Ping/pong heartbeat for WebSocket keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use murmur_core::config::realtime::RealtimeConfig;
use tokio::time;
use tracing::{debug, warn};

use super::handle::{ConnectionHandle, SendOutcome};
use crate::message::types::OutboundMessage;

/// Heartbeat configuration
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Silence after which the connection is considered dead
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds.max(1)),
            ping_timeout: Duration::from_secs(config.ping_timeout_seconds.max(1)),
        }
    }
}

/// Run the heartbeat loop for a connection.
///
/// Sends a ping every interval and closes the handle once no pong has
/// arrived within the timeout, or the outbound queue is gone. Returns when
/// the connection is no longer alive.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        if !handle.is_alive() {
            break;
        }

        let silent_for = (Utc::now() - handle.last_pong()).to_std().unwrap_or_default();
        if silent_for > config.ping_timeout {
            warn!(
                conn_id = %handle.id,
                silent_ms = silent_for.as_millis() as u64,
                "Heartbeat timeout"
            );
            handle.close();
            break;
        }

        let ping = OutboundMessage::Ping {
            timestamp: Utc::now().timestamp_millis(),
        };
        if handle.send_message(&ping).await == SendOutcome::Closed {
            debug!(conn_id = %handle.id, "Ping send failed, closing");
            handle.close();
            break;
        }
    }

    debug!(conn_id = %handle.id, "Heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn test_sends_ping() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = Arc::new(ConnectionHandle::new(None, tx, Duration::from_millis(50)));
        let task = tokio::spawn(run_heartbeat(
            handle.clone(),
            HeartbeatConfig {
                ping_interval: Duration::from_millis(10),
                ping_timeout: Duration::from_secs(30),
            },
        ));

        let frame = rx.recv().await.unwrap();
        assert!(frame.contains(r#""type":"ping""#));

        handle.close();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_queue_ends_loop() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let handle = Arc::new(ConnectionHandle::new(None, tx, Duration::from_millis(50)));

        run_heartbeat(
            handle.clone(),
            HeartbeatConfig {
                ping_interval: Duration::from_millis(5),
                ping_timeout: Duration::from_secs(30),
            },
        )
        .await;

        assert!(!handle.is_alive());
    }
}
