//! WebSocket connection lifecycle.

pub mod authenticator;
pub mod handle;
pub mod heartbeat;
pub mod manager;
pub mod pool;

pub use authenticator::{ConnectionAuthenticator, HandshakeState, PendingHandshake, RejectReason};
pub use handle::{ConnectionHandle, SendOutcome};
pub use heartbeat::{HeartbeatConfig, run_heartbeat};
pub use manager::{ConnectionGuard, ConnectionManager};
pub use pool::ConnectionPool;
