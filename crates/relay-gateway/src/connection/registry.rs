//! Connection registry
//!
//! The set of live connections. Every operation runs under a single mutex, so an
//! iteration never observes a registration or removal half-applied.

use super::Connection;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Tracks every connection eligible for delivery
pub struct ConnectionRegistry {
    /// Live connections by ID
    connections: Mutex<HashMap<String, Arc<Connection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Register a connection
    ///
    /// Returns false, leaving the existing entry untouched, if the ID is already present.
    pub fn register(&self, connection: Arc<Connection>) -> bool {
        let mut connections = self.connections.lock();
        if connections.contains_key(connection.id()) {
            return false;
        }
        connections.insert(connection.id().to_string(), connection);
        true
    }

    /// Remove a connection, returning it if it was present
    pub fn unregister(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.lock().remove(id)
    }

    /// Visit every registered connection while holding the lock
    ///
    /// `visit` must not call back into the registry.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&Arc<Connection>),
    {
        for connection in self.connections.lock().values() {
            visit(connection);
        }
    }

    /// Copy out the current set of connections
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        let mut connections = Vec::with_capacity(self.len());
        self.for_each(|connection| connections.push(connection.clone()));
        connections
    }

    /// Check if a connection is registered
    pub fn contains(&self, id: &str) -> bool {
        self.connections.lock().contains_key(id)
    }

    /// Get the number of registered connections
    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.len())
            .finish()
    }
}
