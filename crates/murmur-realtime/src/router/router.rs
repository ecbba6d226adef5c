//! Message router.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::connection::handle::{ConnectionHandle, SendOutcome};
use crate::connection::pool::ConnectionPool;
use crate::message::types::OutboundMessage;
use crate::metrics::RealtimeMetrics;
use crate::presence::tracker::PresenceTracker;
use crate::topic::registry::TopicRegistry;

use super::destination::Destination;
use super::report::DeliveryReport;

/// Resolves destinations to live connections and fans frames out to them.
///
/// Targets are a snapshot taken before any send; no registry lock is held
/// while sending. Every send is bounded by the connection's send timeout
/// and runs concurrently, so one slow or dead target never holds up the
/// others.
#[derive(Debug)]
pub struct MessageRouter {
    pool: Arc<ConnectionPool>,
    presence: Arc<PresenceTracker>,
    topics: Arc<TopicRegistry>,
    metrics: Arc<RealtimeMetrics>,
}

impl MessageRouter {
    /// Creates a new router.
    pub fn new(
        pool: Arc<ConnectionPool>,
        presence: Arc<PresenceTracker>,
        topics: Arc<TopicRegistry>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            pool,
            presence,
            topics,
            metrics,
        }
    }

    /// Deliver `message` to every live connection behind `destination`.
    pub async fn route(&self, destination: &Destination, message: &OutboundMessage) -> DeliveryReport {
        let mut report = DeliveryReport::empty(destination.clone());

        let targets = self.resolve(destination);
        if targets.is_empty() {
            debug!(destination = %destination, "No live targets");
            return report;
        }

        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(destination = %destination, error = %e, "Failed to serialize routed message");
                return report;
            }
        };

        let outcomes = join_all(targets.iter().map(|handle| {
            let payload = payload.clone();
            async move { (handle.id, handle.send(payload).await) }
        }))
        .await;

        for (conn_id, outcome) in outcomes {
            report.attempted.push(conn_id);
            match outcome {
                SendOutcome::Delivered => report.delivered.push(conn_id),
                failed => report.failed.push((conn_id, failed)),
            }
        }

        self.metrics.record_delivery(
            report.attempted.len(),
            report.delivered.len(),
            report.failed.len(),
        );

        if !report.failed.is_empty() {
            warn!(
                destination = %destination,
                attempted = report.attempted.len(),
                failed = report.failed.len(),
                "Partial delivery failure"
            );
        }

        report
    }

    fn resolve(&self, destination: &Destination) -> Vec<Arc<ConnectionHandle>> {
        let mut targets: Vec<Arc<ConnectionHandle>> = match destination {
            Destination::ToUser(user_id) => self.pool.user_connections(user_id),
            Destination::ToRoom(room_id) => self
                .presence
                .room_members(room_id)
                .iter()
                .flat_map(|user_id| self.pool.user_connections(user_id))
                .collect(),
            Destination::ToTopic(topic) => self
                .topics
                .subscribers(topic)
                .iter()
                .filter_map(|conn_id| self.pool.get(conn_id))
                .collect(),
        };
        targets.retain(|handle| handle.is_alive());
        targets
    }
}
