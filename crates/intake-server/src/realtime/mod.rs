//! Real-time message relay.
//!
//! Every WebSocket connection is registered in a [`ConnectionRegistry`] with a
//! bounded outbound queue. Text received on any connection is fanned out by
//! the [`BroadcastHub`] to all registered connections, the sender included.

pub mod hub;
pub mod registry;
pub mod socket;

pub use hub::{BroadcastHub, ConnectionSession, FanoutReport, OverflowPolicy};
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry};
pub use socket::{ConnectionEvent, run_connection};
