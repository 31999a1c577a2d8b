//! Fan-out of inbound messages to every registered connection.

use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, mpsc};

use super::registry::{ConnectionHandle, ConnectionId, ConnectionRegistry};
use crate::config::RealtimeConfig;

/// What to do when a connection's outbound queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Skip this message for the slow connection only.
    #[default]
    DropMessage,
    /// Unregister the slow connection and close it.
    Disconnect,
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: usize,
    pub dropped: usize,
    pub disconnected: usize,
}

/// The receiving half of a registered connection.
pub struct ConnectionSession {
    pub id: ConnectionId,
    pub outbound: mpsc::Receiver<Utf8Bytes>,
    pub shutdown: Arc<Notify>,
}

#[derive(Debug)]
pub struct BroadcastHub {
    registry: ConnectionRegistry,
    queue_capacity: usize,
    overflow: OverflowPolicy,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::from_config(&RealtimeConfig::default())
    }
}

impl BroadcastHub {
    pub fn new(queue_capacity: usize, overflow: OverflowPolicy) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            // mpsc::channel panics on zero capacity
            queue_capacity: queue_capacity.max(1),
            overflow,
        }
    }

    pub fn from_config(cfg: &RealtimeConfig) -> Self {
        Self::new(cfg.queue_capacity, cfg.overflow_policy)
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Register a new connection and hand back its receiving half.
    pub fn open(&self) -> ConnectionSession {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let shutdown = Arc::new(Notify::new());
        self.registry
            .register(ConnectionHandle::new(id, tx, shutdown.clone()));
        ConnectionSession {
            id,
            outbound: rx,
            shutdown,
        }
    }

    /// Deliver `message` to every open connection, the sender included.
    ///
    /// Never waits on a connection; a failure on one connection does not
    /// affect delivery to the others.
    pub fn fanout(&self, message: Utf8Bytes, sender: ConnectionId) -> FanoutReport {
        let mut report = FanoutReport::default();

        for handle in self.registry.snapshot() {
            match handle.try_send(message.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => match self.overflow {
                    OverflowPolicy::DropMessage => {
                        tracing::warn!(
                            connection_id = %handle.id(),
                            "Outbound queue full, message dropped"
                        );
                        report.dropped += 1;
                    }
                    OverflowPolicy::Disconnect => {
                        tracing::warn!(
                            connection_id = %handle.id(),
                            "Outbound queue full, disconnecting slow client"
                        );
                        self.disconnect(&handle);
                        report.disconnected += 1;
                    }
                },
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(
                        connection_id = %handle.id(),
                        "Connection already closed, removing"
                    );
                    self.registry.unregister(handle.id());
                    report.disconnected += 1;
                }
            }
        }

        tracing::debug!(
            sender = %sender,
            delivered = report.delivered,
            dropped = report.dropped,
            disconnected = report.disconnected,
            "Message fanned out"
        );
        report
    }

    /// Ask every connection to close. Returns how many were signalled.
    pub fn close_all(&self) -> usize {
        let handles = self.registry.snapshot();
        for handle in &handles {
            self.disconnect(handle);
        }
        handles.len()
    }

    fn disconnect(&self, handle: &ConnectionHandle) {
        self.registry.unregister(handle.id());
        handle.close();
    }
}
