//! Connection registry: client id -> outbound frame channel.
//!
//! Each live connection owns one bounded mpsc channel whose receiver is
//! drained by the transport's writer task. The registry holds the only
//! long-lived sender, so dropping a registration (replace, release,
//! unregister) ends the writer and closes the transport.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use chatrelay_types::frame::OutboundFrame;

/// Sending half of a connection's outbound frame queue.
pub type OutboundSender = mpsc::Sender<OutboundFrame>;

#[derive(Debug)]
struct Registration {
    connection_id: Uuid,
    sender: OutboundSender,
    connected_at: DateTime<Utc>,
}

/// Live connections, at most one per client id.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<String, Registration>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sender` as the channel for `client_id`.
    ///
    /// Register-or-replace: a previous channel for the same id is dropped,
    /// which closes the stale connection. Returns the id of the new
    /// registration, needed later by [`release`](Self::release).
    pub fn register(&self, client_id: &str, sender: OutboundSender) -> Uuid {
        let connection_id = Uuid::now_v7();
        let registration = Registration {
            connection_id,
            sender,
            connected_at: Utc::now(),
        };

        if let Some(previous) = self.connections.insert(client_id.to_string(), registration) {
            tracing::info!(
                client_id,
                %connection_id,
                replaced = %previous.connection_id,
                connected_at = %previous.connected_at,
                "Replacing stale connection"
            );
        } else {
            tracing::debug!(client_id, %connection_id, "Registered connection");
        }

        connection_id
    }

    /// Remove whatever channel is registered for `client_id`. Idempotent.
    pub fn unregister(&self, client_id: &str) -> bool {
        self.connections.remove(client_id).is_some()
    }

    /// Remove the registration for `client_id` only if it is still
    /// `connection_id`.
    ///
    /// A connection that has been replaced must not evict its successor
    /// when it shuts down.
    pub fn release(&self, client_id: &str, connection_id: Uuid) -> bool {
        let removed = self
            .connections
            .remove_if(client_id, |_, reg| reg.connection_id == connection_id)
            .is_some();
        if !removed {
            tracing::debug!(
                client_id,
                %connection_id,
                "Connection already replaced or unregistered"
            );
        }
        removed
    }

    /// Queue a frame for one client.
    ///
    /// Returns whether the frame was queued. An unknown client or a closed
    /// channel is an expected disconnect race, so it is logged and never
    /// escalated.
    pub async fn send(&self, client_id: &str, frame: OutboundFrame) -> bool {
        // Clone the sender out so the shard guard is released before awaiting.
        let sender = match self.connections.get(client_id) {
            Some(reg) => reg.sender.clone(),
            None => {
                tracing::debug!(
                    client_id,
                    frame = frame.kind(),
                    "Dropping frame for unregistered client"
                );
                return false;
            }
        };

        match sender.send(frame).await {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(
                    client_id,
                    frame = err.0.kind(),
                    "Dropping frame for closed connection"
                );
                false
            }
        }
    }

    /// Offer a frame to every live connection.
    ///
    /// Best-effort: a full or closed channel skips that client and the
    /// broadcast continues. Returns the number of clients reached.
    pub fn broadcast_all(&self, frame: &OutboundFrame) -> usize {
        let targets: Vec<(String, OutboundSender)> = self
            .connections
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().sender.clone()))
            .collect();

        let mut delivered = 0;
        for (client_id, sender) in targets {
            match sender.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(client_id, "Broadcast skipped: outbound queue full");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(client_id, "Broadcast skipped: connection closed");
                }
            }
        }
        delivered
    }

    pub fn is_registered(&self, client_id: &str) -> bool {
        self.connections.contains_key(client_id)
    }

    /// Registration id currently held for `client_id`.
    pub fn connection_id(&self, client_id: &str) -> Option<Uuid> {
        self.connections.get(client_id).map(|reg| reg.connection_id)
    }

    /// Client ids with a live connection, in no particular order.
    pub fn client_ids(&self) -> Vec<String> {
        self.connections.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
