//! Read and delete access to session history for the HTTP surface.

use std::sync::Arc;

use chatrelay_types::chat::{ChatSession, DeleteAck};
use chatrelay_types::error::SessionError;

use crate::session::SessionStore;

/// History operations exposed outside the WebSocket relay.
#[derive(Debug, Clone)]
pub struct HistoryService {
    sessions: Arc<SessionStore>,
}

impl HistoryService {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }

    /// Full history of one client.
    pub fn get_history(&self, client_id: &str) -> Result<ChatSession, SessionError> {
        self.sessions.get(client_id)
    }

    /// Delete a client's history. Always acknowledges, even when there was
    /// nothing to delete.
    pub fn delete_history(&self, client_id: &str) -> DeleteAck {
        let removed = self.sessions.delete(client_id);
        tracing::info!(client_id, removed, "Chat session delete requested");
        DeleteAck::session_deleted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_types::chat::Message;

    fn service() -> (HistoryService, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::new());
        (HistoryService::new(Arc::clone(&store)), store)
    }

    #[test]
    fn test_get_history_returns_messages() {
        let (history, store) = service();
        store.get_or_create("abc");
        store.append("abc", Message::user("hello")).unwrap();
        store.append("abc", Message::assistant("hi there")).unwrap();

        let session = history.get_history("abc").unwrap();
        assert_eq!(session.id, "abc");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].content, "hi there");
    }

    #[test]
    fn test_get_history_unknown_client() {
        let (history, _) = service();
        assert_eq!(history.get_history("nobody"), Err(SessionError::NotFound));
    }

    #[test]
    fn test_delete_history_then_get_is_not_found() {
        let (history, store) = service();
        store.get_or_create("abc");

        let ack = history.delete_history("abc");
        assert_eq!(ack, DeleteAck::session_deleted());
        assert_eq!(history.get_history("abc"), Err(SessionError::NotFound));
    }

    #[test]
    fn test_delete_history_unknown_client_still_acknowledges() {
        let (history, _) = service();
        assert_eq!(history.delete_history("nobody"), DeleteAck::session_deleted());
    }
}
