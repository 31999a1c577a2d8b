//! Registry of live WebSocket connections.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use parking_lot::RwLock;
use tokio::sync::{Notify, mpsc};
use uuid::Uuid;

/// Identifier of one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle for queueing messages to a connected WebSocket client.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::Sender<Utf8Bytes>,
    shutdown: Arc<Notify>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, sender: mpsc::Sender<Utf8Bytes>, shutdown: Arc<Notify>) -> Self {
        Self {
            id,
            sender,
            shutdown,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a message without waiting for room.
    pub fn try_send(&self, message: Utf8Bytes) -> Result<(), mpsc::error::TrySendError<Utf8Bytes>> {
        self.sender.try_send(message)
    }

    /// Ask the connection task to send a close frame and exit.
    pub fn close(&self) {
        self.shutdown.notify_one();
    }
}

/// Set of open connections, safe under concurrent churn.
///
/// The lock is only held for map operations, never across an await.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handle: ConnectionHandle) {
        let id = handle.id();
        self.connections.write().insert(id, handle);
        tracing::debug!(connection_id = %id, "WebSocket connection registered");
    }

    /// Remove a connection. Returns false if it was already gone.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.connections.write().remove(&id).is_some();
        if removed {
            tracing::debug!(connection_id = %id, "WebSocket connection unregistered");
        }
        removed
    }

    /// Stable copy of the current members for iteration.
    pub fn snapshot(&self) -> Vec<ConnectionHandle> {
        self.connections.read().values().cloned().collect()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (ConnectionHandle, mpsc::Receiver<Utf8Bytes>) {
        let (tx, rx) = mpsc::channel(4);
        (
            ConnectionHandle::new(ConnectionId::new(), tx, Arc::new(Notify::new())),
            rx,
        )
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (h, _rx) = handle();
        let id = h.id();

        registry.register(h);
        assert_eq!(registry.len(), 1);
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_survives_removal() {
        let registry = ConnectionRegistry::new();
        let (a, _ra) = handle();
        let (b, _rb) = handle();
        let a_id = a.id();
        registry.register(a);
        registry.register(b);

        let snapshot = registry.snapshot();
        registry.unregister(a_id);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(a_id));
    }

    #[test]
    fn test_send_to_dropped_receiver_is_closed() {
        let (h, rx) = handle();
        assert!(h.try_send(Utf8Bytes::from_static("a")).is_ok());
        drop(rx);
        assert!(matches!(
            h.try_send(Utf8Bytes::from_static("b")),
            Err(mpsc::error::TrySendError::Closed(_))
        ));
    }
}
