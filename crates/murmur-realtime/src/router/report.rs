//! Per-call delivery outcome.

use murmur_core::error::AppError;
use murmur_core::types::ConnectionId;

use super::destination::Destination;
use crate::connection::handle::SendOutcome;

/// Which connections a routing call targeted and how each send went.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    /// The routed destination.
    pub destination: Destination,
    /// Every connection a send was attempted on.
    pub attempted: Vec<ConnectionId>,
    /// Connections whose queue accepted the frame.
    pub delivered: Vec<ConnectionId>,
    /// Connections that timed out or were closed.
    pub failed: Vec<(ConnectionId, SendOutcome)>,
}

impl DeliveryReport {
    pub(crate) fn empty(destination: Destination) -> Self {
        Self {
            destination,
            attempted: Vec::new(),
            delivered: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// No live connection matched the destination.
    pub fn has_no_targets(&self) -> bool {
        self.attempted.is_empty()
    }

    /// Some, but not all, targets failed.
    pub fn is_partial_failure(&self) -> bool {
        !self.failed.is_empty() && !self.delivered.is_empty()
    }

    /// For callers that expect an acknowledgement: a `ToUser` destination
    /// with zero live connections becomes a `DestinationNotFound` error.
    pub fn require_recipient(&self) -> Result<&Self, AppError> {
        match &self.destination {
            Destination::ToUser(user_id) if self.has_no_targets() => Err(
                AppError::destination_not_found(format!("User {user_id} has no live connection")),
            ),
            _ => Ok(self),
        }
    }
}
