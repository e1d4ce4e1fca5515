//! Connection Registry
//!
//! Tracks the set of currently open connections. Membership changes only
//! through [`Registry::add`] and [`Registry::remove`]; readers get a
//! point-in-time [`Registry::snapshot`] and never iterate the live map.

use std::collections::HashMap;
use tokio::sync::RwLock;

use super::connection::{ConnectionHandle, ConnectionId};

/// Process-wide set of open connections
#[derive(Default)]
pub struct Registry {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection
    ///
    /// Returns false if a connection with the same id is already present;
    /// the existing entry is left untouched.
    pub async fn add(&self, handle: ConnectionHandle) -> bool {
        self.try_add(handle, usize::MAX).await
    }

    /// Register a connection unless `limit` connections are already present
    ///
    /// The limit check and the insert happen under the same write guard, so
    /// concurrent callers can never push membership past `limit`.
    pub async fn try_add(&self, handle: ConnectionHandle, limit: usize) -> bool {
        let id = handle.id();
        let mut connections = self.connections.write().await;
        if connections.len() >= limit {
            return false;
        }
        if connections.contains_key(&id) {
            tracing::warn!(connection_id = %id, "Connection already registered");
            return false;
        }
        connections.insert(id, handle);
        let total = connections.len();
        drop(connections);

        tracing::info!(connection_id = %id, connections = total, "Connection registered");
        true
    }

    /// Deregister a connection and mark it closed
    ///
    /// Removing an unknown id is a no-op.
    pub async fn remove(&self, id: &ConnectionId) -> Option<ConnectionHandle> {
        let removed = self.connections.write().await.remove(id);

        if let Some(handle) = &removed {
            handle.close();
            tracing::info!(connection_id = %id, "Connection deregistered");
        }

        removed
    }

    /// Point-in-time copy of current membership
    pub async fn snapshot(&self) -> Vec<ConnectionHandle> {
        self.connections.read().await.values().cloned().collect()
    }

    pub async fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}
