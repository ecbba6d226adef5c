//! Tracks all active connections indexed by user ID.

use std::sync::Arc;

use dashmap::DashMap;

use murmur_core::types::{ConnectionId, UserId};

use super::handle::ConnectionHandle;

/// Thread-safe pool of all active WebSocket connections.
///
/// Anonymous connections are indexed by ID only.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// User ID → that user's connections (one per device).
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID → connection handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle.clone());
        if let Some(user_id) = handle.user_id() {
            self.by_user.entry(user_id).or_default().push(handle);
        }
    }

    /// Removes a connection from the pool.
    ///
    /// Returns the handle only to the first caller for a given ID.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        if let Some(user_id) = handle.user_id() {
            self.by_user.remove_if_mut(&user_id, |_, connections| {
                connections.retain(|c| c.id != *conn_id);
                connections.is_empty()
            });
        }
        Some(handle)
    }

    /// Gets all connections for a user.
    pub fn user_connections(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Returns total number of active connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
