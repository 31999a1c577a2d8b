//! Per-connection WebSocket loop.

use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::{SinkExt, Stream, StreamExt};

use super::hub::{BroadcastHub, ConnectionSession};

/// A transport-level happening on one connection.
#[derive(Debug)]
pub enum ConnectionEvent {
    Message(Utf8Bytes),
    Closed,
    Error(axum::Error),
}

/// Wait for the next event that matters to the hub.
///
/// Control frames are answered by the transport and binary frames are not
/// relayed, so both are skipped.
pub async fn next_event<S>(stream: &mut S) -> ConnectionEvent
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => return ConnectionEvent::Message(text),
            Some(Ok(Message::Close(_))) | None => return ConnectionEvent::Closed,
            Some(Ok(Message::Binary(data))) => {
                tracing::debug!(len = data.len(), "Ignoring binary frame");
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            Some(Err(e)) => return ConnectionEvent::Error(e),
        }
    }
}

/// Drive one WebSocket until it closes, errors, or the hub closes it.
pub async fn run_connection(socket: WebSocket, hub: Arc<BroadcastHub>) {
    let ConnectionSession {
        id,
        mut outbound,
        shutdown,
    } = hub.open();

    tracing::info!(
        connection_id = %id,
        connections = hub.registry().len(),
        "WebSocket connection established"
    );

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = next_event(&mut receiver) => {
                match event {
                    ConnectionEvent::Message(text) => {
                        hub.fanout(text, id);
                    }
                    ConnectionEvent::Closed => {
                        tracing::info!(connection_id = %id, "Client closed WebSocket");
                        break;
                    }
                    ConnectionEvent::Error(e) => {
                        tracing::warn!(connection_id = %id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            msg = outbound.recv() => {
                match msg {
                    Some(text) => {
                        if let Err(e) = sender.send(Message::Text(text)).await {
                            tracing::debug!(connection_id = %id, error = %e, "Failed to send message");
                            break;
                        }
                    }
                    None => break,
                }
            }

            _ = shutdown.notified() => {
                let _ = sender.send(Message::Close(None)).await;
                tracing::debug!(connection_id = %id, "Connection closed by server");
                break;
            }
        }
    }

    hub.registry().unregister(id);

    tracing::info!(
        connection_id = %id,
        connections = hub.registry().len(),
        "WebSocket connection closed"
    );
}
