//! Destination-addressed fan-out to live connections.

pub mod destination;
pub mod report;
#[allow(clippy::module_inception)]
pub mod router;

pub use destination::Destination;
pub use report::DeliveryReport;
pub use router::MessageRouter;
