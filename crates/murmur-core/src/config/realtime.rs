//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound queue.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Upper bound on a single per-connection send, in milliseconds.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_ms: u64,
    /// WebSocket ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Seconds without a pong before a connection is considered dead.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_seconds: u64,
    /// Seconds to wait for a `connect` frame when the upgrade carried no credentials.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_seconds: u64,
    /// Maximum topic subscriptions per connection.
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions_per_connection: usize,
    /// Capacity of the presence event broadcast channel.
    #[serde(default = "default_presence_buffer")]
    pub presence_event_buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            send_timeout_ms: default_send_timeout(),
            ping_interval_seconds: default_ping_interval(),
            ping_timeout_seconds: default_ping_timeout(),
            handshake_timeout_seconds: default_handshake_timeout(),
            max_subscriptions_per_connection: default_max_subscriptions(),
            presence_event_buffer: default_presence_buffer(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_send_timeout() -> u64 {
    2000
}

fn default_ping_interval() -> u64 {
    10
}

fn default_ping_timeout() -> u64 {
    30
}

fn default_handshake_timeout() -> u64 {
    10
}

fn default_max_subscriptions() -> usize {
    100
}

fn default_presence_buffer() -> usize {
    1024
}
