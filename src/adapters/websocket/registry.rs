//! Connection registry - the process-local set of live subscribers.
//!
//! The registry is owned by the service context and shared by reference
//! with the session handlers (which register/unregister) and the
//! broadcaster (which snapshots).
//!
//! # Thread Safety
//!
//! Uses a `parking_lot::RwLock` around a map keyed by connection id.
//! Snapshots copy the membership out under the read lock, so iteration
//! and sends happen without holding the lock. The lock is synchronous so
//! drop guards can unregister without an async context.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::foundation::{ConnectionId, TenantId};
use crate::ports::SubscriberConnection;

/// Set of live subscriber connections, keyed by identity.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Arc<dyn SubscriberConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Registering the same identity again replaces the
    /// handle; membership never holds duplicates.
    pub fn register(&self, connection: Arc<dyn SubscriberConnection>) {
        let id = connection.id();
        let previous = self.connections.write().insert(id, connection);
        if previous.is_none() {
            tracing::debug!(connection_id = %id, "connection registered");
        }
    }

    /// Remove a connection. Returns whether it was present.
    pub fn unregister(&self, id: &ConnectionId) -> bool {
        let removed = self.connections.write().remove(id).is_some();
        if removed {
            tracing::debug!(connection_id = %id, "connection unregistered");
        }
        removed
    }

    /// Copy of the current membership.
    pub fn snapshot(&self) -> Vec<Arc<dyn SubscriberConnection>> {
        self.connections.read().values().cloned().collect()
    }

    /// Copy of the connections admitted for `tenant`.
    pub fn snapshot_for_tenant(&self, tenant: &TenantId) -> Vec<Arc<dyn SubscriberConnection>> {
        self.connections
            .read()
            .values()
            .filter(|c| c.tenant() == Some(tenant))
            .cloned()
            .collect()
    }

    /// Identities of the current members.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.read().keys().copied().collect()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}

/// Unregisters a connection when dropped.
///
/// Held by the session loop so de-registration runs on every exit path,
/// including panics and task cancellation.
pub struct RegistrationGuard {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl RegistrationGuard {
    /// Register `connection` and return the guard that will remove it.
    pub fn register(registry: Arc<ConnectionRegistry>, connection: Arc<dyn SubscriberConnection>) -> Self {
        let id = connection.id();
        registry.register(connection);
        Self { registry, id }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.registry.unregister(&self.id);
    }
}
