//! RelayEngine: one control loop per client connection.
//!
//! A connection moves `Connecting -> Open -> Closed`. While open, frames are
//! handled strictly one at a time, so outbound frames for one client are
//! always in order and a `stream_complete` never overtakes its `stream`
//! frames. The transport is read by a separate pump task; when the client
//! goes away the pump cancels the in-flight frame at its current await
//! point instead of letting it run to completion.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::{FutureExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span};
use uuid::Uuid;

use chatrelay_types::chat::Message;
use chatrelay_types::error::TransportError;
use chatrelay_types::frame::{FeedbackRecord, InboundFrame, OutboundFrame, ResponseMetadata};
use chatrelay_types::llm::LlmError;

use crate::connection::{ConnectionRegistry, OutboundSender};
use crate::llm::gateway::CompletionGateway;
use crate::sentiment::{SentimentFn, estimate_sentiment};
use crate::session::SessionStore;

const DEFAULT_INBOUND_BUFFER: usize = 16;

/// Lifecycle of a relayed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// Why a connection reached `Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The client closed the transport.
    Disconnected,
    /// Reading from the transport failed.
    TransportFault(TransportError),
    /// Another connection registered under the same client id.
    Replaced,
    /// Frame handling panicked.
    Fault(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Disconnected => write!(f, "client disconnected"),
            CloseReason::TransportFault(err) => write!(f, "{err}"),
            CloseReason::Replaced => write!(f, "replaced by a newer connection"),
            CloseReason::Fault(message) => write!(f, "fault: {message}"),
        }
    }
}

/// Relays client frames to the completion gateway and responses back.
///
/// Holds only shared services, so one engine serves every connection.
pub struct RelayEngine {
    sessions: Arc<SessionStore>,
    connections: Arc<ConnectionRegistry>,
    gateway: Arc<CompletionGateway>,
    sentiment: SentimentFn,
    inbound_buffer: usize,
}

impl RelayEngine {
    pub fn new(
        sessions: Arc<SessionStore>,
        connections: Arc<ConnectionRegistry>,
        gateway: Arc<CompletionGateway>,
    ) -> Self {
        Self {
            sessions,
            connections,
            gateway,
            sentiment: estimate_sentiment,
            inbound_buffer: DEFAULT_INBOUND_BUFFER,
        }
    }

    /// Replace the sentiment estimator used for response metadata.
    pub fn with_sentiment(mut self, sentiment: SentimentFn) -> Self {
        self.sentiment = sentiment;
        self
    }

    /// Number of inbound frames buffered while a response is in flight.
    pub fn with_inbound_buffer(mut self, inbound_buffer: usize) -> Self {
        self.inbound_buffer = inbound_buffer.max(1);
        self
    }

    /// Serve one client connection until it closes.
    ///
    /// `outbound` is registered under `client_id` (replacing any previous
    /// connection) and the session is created if it does not exist yet.
    /// `inbound` yields raw text frames and ends when the client
    /// disconnects. On return the registration has been released; the
    /// session is kept.
    pub async fn run<S>(&self, client_id: &str, outbound: OutboundSender, inbound: S) -> CloseReason
    where
        S: Stream<Item = Result<String, TransportError>> + Send + 'static,
    {
        let span = info_span!(
            "relay_connection",
            client_id,
            connection_id = tracing::field::Empty,
        );
        self.serve(client_id, outbound, inbound)
            .instrument(span)
            .await
    }

    async fn serve<S>(&self, client_id: &str, outbound: OutboundSender, inbound: S) -> CloseReason
    where
        S: Stream<Item = Result<String, TransportError>> + Send + 'static,
    {
        let mut state = ConnectionState::Connecting;
        tracing::debug!(%state, "Accepting connection");

        let connection_id = self.connections.register(client_id, outbound);
        tracing::Span::current().record("connection_id", tracing::field::display(connection_id));
        let session = self.sessions.get_or_create(client_id);

        state = ConnectionState::Open;
        tracing::info!(%state, history = session.len(), "Client connected");

        let disconnected = CancellationToken::new();
        let (frame_tx, mut frames) = mpsc::channel(self.inbound_buffer);
        let pump = tokio::spawn(pump_inbound(inbound, frame_tx, disconnected.clone()));

        let closed_by_loop = loop {
            let text = tokio::select! {
                biased;
                _ = disconnected.cancelled() => break None,
                text = frames.recv() => match text {
                    Some(text) => text,
                    None => break None,
                },
            };

            if !self.is_current(client_id, connection_id) {
                break Some(CloseReason::Replaced);
            }

            let handled = tokio::select! {
                biased;
                _ = disconnected.cancelled() => None,
                outcome = AssertUnwindSafe(self.dispatch(client_id, &text)).catch_unwind() => Some(outcome),
            };

            match handled {
                Some(Ok(())) => {}
                Some(Err(panic)) => {
                    let message = panic_message(panic);
                    tracing::error!(error = %message, "Frame handling panicked");
                    break Some(CloseReason::Fault(message));
                }
                None => {
                    tracing::debug!("Client disconnected mid-request; abandoning response");
                    break None;
                }
            }
        };

        drop(frames);
        let reason = match closed_by_loop {
            Some(reason) => {
                pump.abort();
                reason
            }
            None => pump
                .await
                .unwrap_or_else(|err| CloseReason::Fault(err.to_string())),
        };

        self.connections.release(client_id, connection_id);
        state = ConnectionState::Closed;

        match &reason {
            CloseReason::Disconnected | CloseReason::Replaced => {
                tracing::info!(%state, %reason, "Connection closed");
            }
            CloseReason::TransportFault(_) | CloseReason::Fault(_) => {
                tracing::warn!(%state, %reason, "Connection closed");
            }
        }

        reason
    }

    fn is_current(&self, client_id: &str, connection_id: Uuid) -> bool {
        self.connections.connection_id(client_id) == Some(connection_id)
    }

    /// Handle one raw inbound frame.
    async fn dispatch(&self, client_id: &str, text: &str) {
        match InboundFrame::parse(text) {
            Ok(InboundFrame::Message { content, stream }) => {
                self.relay_message(client_id, content, stream).await;
            }
            Ok(InboundFrame::Feedback { message_id, rating }) => {
                let record = FeedbackRecord {
                    session_id: client_id.to_string(),
                    message_id,
                    rating,
                };
                tracing::info!(
                    session_id = %record.session_id,
                    message_id = %record.message_id,
                    rating = %record.rating,
                    "Feedback received"
                );
                self.connections
                    .send(client_id, OutboundFrame::FeedbackReceived)
                    .await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Rejected inbound frame");
                self.connections
                    .send(client_id, OutboundFrame::error(&err))
                    .await;
            }
        }
    }

    // Frames go out by client id, so if this connection is replaced
    // mid-response its remaining frames reach the newer connection.
    async fn relay_message(&self, client_id: &str, content: String, stream: bool) {
        if let Err(err) = self.sessions.append(client_id, Message::user(content)) {
            tracing::warn!(error = %err, "Message for a deleted session");
            self.connections.send(client_id, OutboundFrame::error(err)).await;
            return;
        }

        let started = Instant::now();
        let history = match self.sessions.messages(client_id) {
            Ok(history) => history,
            Err(err) => {
                self.connections.send(client_id, OutboundFrame::error(err)).await;
                return;
            }
        };

        let mode = if stream { "stream" } else { "atomic" };
        let outcome = if stream {
            self.relay_streaming(client_id, &history, started).await
        } else {
            self.relay_atomic(client_id, &history, started).await
        };

        match outcome {
            Ok(()) => {
                tracing::debug!(
                    mode,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Response relayed"
                );
            }
            Err(err) => {
                tracing::warn!(mode, error = %err, "Completion failed");
                self.connections.send(client_id, OutboundFrame::error(err)).await;
            }
        }
    }

    async fn relay_atomic(
        &self,
        client_id: &str,
        history: &[Message],
        started: Instant,
    ) -> Result<(), LlmError> {
        let content = self.gateway.atomic_complete(history).await?;
        let metadata = self.metadata(&content, started);
        self.record_reply(client_id, &content);

        self.connections
            .send(client_id, OutboundFrame::Message { content, metadata })
            .await;
        Ok(())
    }

    /// Forward each fragment before pulling the next one. On a mid-stream
    /// failure nothing is recorded and no `stream_complete` is sent.
    async fn relay_streaming(
        &self,
        client_id: &str,
        history: &[Message],
        started: Instant,
    ) -> Result<(), LlmError> {
        let mut fragments = self.gateway.stream_complete(history);
        let mut full = String::new();
        let mut count = 0usize;

        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            full.push_str(&fragment);
            count += 1;
            self.connections
                .send(client_id, OutboundFrame::Stream { content: fragment })
                .await;
        }

        let metadata = self.metadata(&full, started);
        self.record_reply(client_id, &full);
        tracing::debug!(fragments = count, length = metadata.length, "Stream finished");

        self.connections
            .send(client_id, OutboundFrame::StreamComplete { metadata })
            .await;
        Ok(())
    }

    fn record_reply(&self, client_id: &str, content: &str) {
        if let Err(err) = self.sessions.append(client_id, Message::assistant(content)) {
            tracing::warn!(error = %err, "Session deleted before the reply was recorded");
        }
    }

    fn metadata(&self, content: &str, started: Instant) -> ResponseMetadata {
        ResponseMetadata {
            response_time: started.elapsed().as_secs_f64(),
            length: content.chars().count(),
            sentiment: (self.sentiment)(content),
        }
    }
}

/// Read the transport into the frame queue until it ends or fails, then
/// signal `disconnected`.
async fn pump_inbound<S>(
    inbound: S,
    frames: mpsc::Sender<String>,
    disconnected: CancellationToken,
) -> CloseReason
where
    S: Stream<Item = Result<String, TransportError>> + Send + 'static,
{
    let mut inbound = std::pin::pin!(inbound);

    let reason = loop {
        match inbound.next().await {
            Some(Ok(text)) => {
                if frames.send(text).await.is_err() {
                    break CloseReason::Disconnected;
                }
            }
            Some(Err(err)) => break CloseReason::TransportFault(err),
            None => break CloseReason::Disconnected,
        }
    };

    disconnected.cancel();
    reason
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
