//! WebSocket transport for the relay.
//!
//! The `/ws/{client_id}` endpoint upgrades an HTTP connection to a
//! WebSocket and hands it to the [`RelayEngine`](chatrelay_core::relay::RelayEngine):
//!
//! - **Inbound:** text frames are forwarded as raw strings; binary, ping
//!   and pong frames are ignored; a close frame or the end of the socket
//!   ends the stream; a receive error surfaces as a transport fault.
//! - **Outbound:** a writer task drains the connection's frame queue and
//!   sends each frame as a JSON text frame. When the queue closes (the
//!   connection was released or replaced) it sends a close frame.

use std::fmt;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use chatrelay_types::error::TransportError;
use chatrelay_types::frame::OutboundFrame;

use crate::state::AppState;

/// Upgrade an HTTP request to a relay WebSocket for `client_id`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, client_id, state))
}

/// Run one relay connection to completion.
async fn handle_ws_connection(socket: WebSocket, client_id: String, state: AppState) {
    let (ws_sender, ws_receiver) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel(state.outbound_buffer());

    let writer = tokio::spawn(write_outbound(ws_sender, outbound_rx));

    let reason = state
        .engine
        .run(&client_id, outbound_tx, inbound_text(ws_receiver))
        .await;

    // The engine released its registration, so the queue closes once drained.
    if let Err(err) = writer.await {
        tracing::warn!(client_id, error = %err, "WebSocket writer task failed");
    }

    tracing::debug!(client_id, %reason, "WebSocket connection closed");
}

/// Adapt a WebSocket receiver into the relay's inbound text stream.
pub(crate) fn inbound_text<S>(
    receiver: S,
) -> impl Stream<Item = Result<String, TransportError>> + Send + 'static
where
    S: Stream<Item = Result<Message, axum::Error>> + Send + Unpin + 'static,
{
    async_stream::stream! {
        let mut receiver = receiver;
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    yield Ok(text.as_str().to_owned());
                }
                Ok(Message::Close(_)) => break,
                // Binary, ping and pong frames carry nothing for the relay.
                Ok(_) => {}
                Err(err) => {
                    yield Err(TransportError::new(err.to_string()));
                    break;
                }
            }
        }
    }
}

/// Drain a connection's outbound queue into the WebSocket sink.
pub(crate) async fn write_outbound<S>(mut sink: S, mut outbound: mpsc::Receiver<OutboundFrame>)
where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
{
    while let Some(frame) = outbound.recv().await {
        let json = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(frame = frame.kind(), "Failed to serialize outbound frame: {err}");
                continue;
            }
        };

        if let Err(err) = sink.send(Message::Text(json.into())).await {
            // Client disconnected; the inbound side will notice too.
            tracing::debug!("WebSocket send failed: {err}");
            return;
        }
    }

    if let Err(err) = sink.send(Message::Close(None)).await {
        tracing::debug!("WebSocket close failed: {err}");
    }
}
