//! WebSocket handler
//!
//! Per-connection glue: registers the socket with the hub, feeds decoded inbound
//! envelopes into the hub, and writes broadcasts back out.

use crate::broadcast::BroadcastHub;
use crate::connection::Connection;
use crate::protocol::CloseCode;
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{stream::SplitStream, Sink, SinkExt, StreamExt};
use relay_core::{Envelope, EnvelopeError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Upper bound on sending the close frame to a client that may have stopped reading
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// What the reader does with one inbound frame
#[derive(Debug)]
enum Inbound {
    Envelope(Envelope),
    Skip,
    Closed,
    Fail(CloseCode),
}

/// WebSocket relay handler
///
/// A failed upgrade only affects the request that attempted it.
pub async fn relay_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_failed_upgrade(|e| {
        tracing::warn!(error = %e, "WebSocket upgrade failed");
    })
    .on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let hub = state.hub().clone();
    let settings = &state.config().hub;

    // Create the outbound buffer drained by the writer
    let (tx, rx) = mpsc::channel::<Arc<Envelope>>(settings.connection_buffer);
    let connection = Connection::new(Connection::generate_id(), tx, settings.send_timeout());

    hub.register(connection.clone());
    tracing::info!(connection_id = %connection.id(), "WebSocket connection established");

    let (ws_sink, mut ws_stream) = socket.split();

    let writer = tokio::spawn(write_loop(ws_sink, rx, hub.clone(), connection.clone()));

    // Read until the client leaves, sends garbage, or the hub drops us
    let close_code = tokio::select! {
        code = read_loop(&hub, &connection, &mut ws_stream) => code,
        () = connection.closed() => None,
    };

    if let Some(code) = close_code {
        tracing::debug!(
            connection_id = %connection.id(),
            close_code = %code,
            "Closing connection"
        );
    }

    cleanup_connection(&hub, &connection).await;

    // The writer has stopped now that the connection is closed; finish the handshake
    match writer.await {
        Ok(mut ws_sink) => {
            let frame = close_code.map(|code| CloseFrame {
                code: code.as_u16(),
                reason: code.reason().into(),
            });
            let finish = async {
                let _ = ws_sink.send(Message::Close(frame)).await;
                let _ = ws_sink.close().await;
            };
            if tokio::time::timeout(CLOSE_TIMEOUT, finish).await.is_err() {
                tracing::debug!(connection_id = %connection.id(), "Close handshake timed out");
            }
        }
        Err(e) => {
            tracing::error!(connection_id = %connection.id(), error = %e, "Writer task failed");
        }
    }
}

/// Decode inbound frames and submit them to the hub
///
/// Returns the close code to send, or `None` for a normal close.
async fn read_loop(
    hub: &BroadcastHub,
    connection: &Connection,
    ws_stream: &mut SplitStream<WebSocket>,
) -> Option<CloseCode> {
    while let Some(frame) = ws_stream.next().await {
        match classify(connection, frame) {
            Inbound::Envelope(envelope) => {
                if hub.submit(envelope).await.is_err() {
                    tracing::error!(connection_id = %connection.id(), "Broadcast hub unavailable");
                    return Some(CloseCode::Unavailable);
                }
            }
            Inbound::Skip => continue,
            Inbound::Closed => return None,
            Inbound::Fail(code) => return Some(code),
        }
    }

    None
}

/// Turn one read result into an action for the reader
fn classify(connection: &Connection, frame: Result<Message, axum::Error>) -> Inbound {
    let decoded = match frame {
        Ok(Message::Text(text)) => Envelope::decode(&text),
        Ok(Message::Binary(bytes)) => Envelope::decode_slice(&bytes),
        // Pong is handled automatically by axum
        Ok(Message::Ping(_) | Message::Pong(_)) => return Inbound::Skip,
        Ok(Message::Close(_)) => {
            tracing::info!(connection_id = %connection.id(), "Client closed connection");
            return Inbound::Closed;
        }
        Err(e) => {
            tracing::warn!(
                connection_id = %connection.id(),
                error = %e,
                "WebSocket error"
            );
            return Inbound::Fail(CloseCode::UnknownError);
        }
    };

    match decoded {
        Ok(envelope) => {
            tracing::trace!(
                connection_id = %connection.id(),
                kind = %envelope.kind(),
                "Received envelope"
            );
            Inbound::Envelope(envelope)
        }
        Err(e) => {
            log_decode_error(connection, &e);
            Inbound::Fail(CloseCode::DecodeError)
        }
    }
}

fn log_decode_error(connection: &Connection, error: &EnvelopeError) {
    tracing::warn!(
        connection_id = %connection.id(),
        code = error.code(),
        error = %error,
        "Failed to decode inbound message"
    );
}

/// Write queued envelopes to the socket until the connection closes
///
/// A write that is still pending when the connection closes is abandoned. Hands the
/// sink back so the caller can send the close frame.
async fn write_loop<S>(
    mut ws_sink: S,
    mut rx: mpsc::Receiver<Arc<Envelope>>,
    hub: Arc<BroadcastHub>,
    connection: Arc<Connection>,
) -> S
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    loop {
        let envelope = tokio::select! {
            envelope = rx.recv() => match envelope {
                Some(envelope) => envelope,
                None => break,
            },
            () = connection.closed() => break,
        };

        let json = match envelope.encode() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(connection_id = %connection.id(), error = %e, "Failed to encode envelope");
                continue;
            }
        };

        let written = tokio::select! {
            written = ws_sink.send(Message::Text(json)) => written,
            () = connection.closed() => break,
        };

        if let Err(e) = written {
            tracing::warn!(
                connection_id = %connection.id(),
                error = %e,
                "Failed to send message to WebSocket"
            );
            hub.unregister(connection.id());
            break;
        }
    }

    ws_sink
}

/// Clean up a connection on disconnect
async fn cleanup_connection(hub: &BroadcastHub, connection: &Connection) {
    // No-op if the hub already dropped it after a failed send
    let removed_here = hub.unregister(connection.id());

    tracing::info!(
        connection_id = %connection.id(),
        removed_here,
        age_ms = connection.age().as_millis() as u64,
        "Connection closed"
    );
}
