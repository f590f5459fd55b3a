//! Session store backed by a sharded concurrent map.
//!
//! Operations on different client ids land on different shards and do not
//! contend. Operations on the same id are serialized by the single control
//! loop that owns that client's connection, so the store never needs
//! per-session locking beyond the shard guard held for the duration of one
//! call. No guard is ever held across an `.await`.

use dashmap::DashMap;

use chatrelay_types::chat::{ChatSession, Message};
use chatrelay_types::error::SessionError;

/// Ephemeral per-client conversation history.
///
/// Nothing is persisted: a process restart clears every session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, ChatSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `client_id`, creating an empty one if absent.
    ///
    /// Idempotent: an existing session is returned untouched.
    pub fn get_or_create(&self, client_id: &str) -> ChatSession {
        self.sessions
            .entry(client_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(client_id, "Creating chat session");
                ChatSession::new(client_id)
            })
            .value()
            .clone()
    }

    /// Append a message to an existing session.
    ///
    /// Returns the new message count. Fails with [`SessionError::NotFound`]
    /// when the session does not exist; sessions are only created by
    /// [`get_or_create`](Self::get_or_create).
    pub fn append(&self, client_id: &str, message: Message) -> Result<usize, SessionError> {
        let mut session = self
            .sessions
            .get_mut(client_id)
            .ok_or(SessionError::NotFound)?;
        session.messages.push(message);
        Ok(session.messages.len())
    }

    /// Snapshot of a session.
    pub fn get(&self, client_id: &str) -> Result<ChatSession, SessionError> {
        self.sessions
            .get(client_id)
            .map(|session| session.value().clone())
            .ok_or(SessionError::NotFound)
    }

    /// Ordered message history of a session, as replayed to the provider.
    pub fn messages(&self, client_id: &str) -> Result<Vec<Message>, SessionError> {
        self.sessions
            .get(client_id)
            .map(|session| session.messages.clone())
            .ok_or(SessionError::NotFound)
    }

    /// Remove a session and all of its messages.
    ///
    /// Never fails; returns whether a session was actually removed.
    pub fn delete(&self, client_id: &str) -> bool {
        let removed = self.sessions.remove(client_id).is_some();
        if removed {
            tracing::debug!(client_id, "Deleted chat session");
        }
        removed
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.sessions.contains_key(client_id)
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
