//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    frames_received: AtomicU64,
    deliveries_attempted: AtomicU64,
    deliveries_succeeded: AtomicU64,
    deliveries_failed: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_suppressed: AtomicU64,
}

impl RealtimeMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection was registered.
    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// A connection was unregistered.
    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// An inbound frame was processed.
    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one routing call.
    pub fn record_delivery(&self, attempted: usize, delivered: usize, failed: usize) {
        self.deliveries_attempted
            .fetch_add(attempted as u64, Ordering::Relaxed);
        self.deliveries_succeeded
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.deliveries_failed
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    /// A notification passed the gate.
    pub fn notification_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// A notification was held back by the gate.
    pub fn notification_suppressed(&self) {
        self.notifications_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            deliveries_attempted: self.deliveries_attempted.load(Ordering::Relaxed),
            deliveries_succeeded: self.deliveries_succeeded.load(Ordering::Relaxed),
            deliveries_failed: self.deliveries_failed.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notifications_suppressed: self.notifications_suppressed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections ever registered.
    pub connections_opened: u64,
    /// Connections ever unregistered.
    pub connections_closed: u64,
    /// Inbound frames processed.
    pub frames_received: u64,
    /// Per-connection sends attempted by the router.
    pub deliveries_attempted: u64,
    /// Sends that reached a connection's queue.
    pub deliveries_succeeded: u64,
    /// Sends that timed out or hit a closed connection.
    pub deliveries_failed: u64,
    /// Notifications stored and routed.
    pub notifications_sent: u64,
    /// Notifications suppressed by user settings.
    pub notifications_suppressed: u64,
}
