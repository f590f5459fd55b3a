//! Session history HTTP handlers.
//!
//! Endpoints:
//! - GET    /sessions/{client_id} - Full message history of a client
//! - DELETE /sessions/{client_id} - Drop a client's history

use axum::Json;
use axum::extract::{Path, State};

use chatrelay_types::chat::{ChatSession, DeleteAck};

use crate::http::error::AppError;
use crate::state::AppState;

/// GET /sessions/{client_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Json<ChatSession>, AppError> {
    let session = state.history.get_history(&client_id)?;
    Ok(Json(session))
}

/// DELETE /sessions/{client_id} - Always succeeds, even for unknown ids.
///
/// A client that is still connected keeps its connection; its next
/// message is answered with an error frame.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Json<DeleteAck> {
    Json(state.history.delete_history(&client_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::test_state;
    use chatrelay_types::chat::Message;
    use chatrelay_types::error::SessionError;

    #[tokio::test]
    async fn test_get_session_returns_history() {
        let state = test_state();
        state.sessions.get_or_create("abc");
        state.sessions.append("abc", Message::user("hello")).unwrap();

        let Json(session) = get_session(State(state), Path("abc".to_string()))
            .await
            .unwrap();
        assert_eq!(session.id, "abc");
        assert_eq!(session.messages, vec![Message::user("hello")]);
    }

    #[tokio::test]
    async fn test_get_unknown_session_is_not_found() {
        let result = get_session(State(test_state()), Path("nobody".to_string())).await;
        assert!(matches!(result, Err(AppError::Session(SessionError::NotFound))));
    }

    #[tokio::test]
    async fn test_delete_session_twice() {
        let state = test_state();
        state.sessions.get_or_create("abc");

        let Json(first) = delete_session(State(state.clone()), Path("abc".to_string())).await;
        let Json(second) = delete_session(State(state.clone()), Path("abc".to_string())).await;

        assert_eq!(first, DeleteAck::session_deleted());
        assert_eq!(second, first);
        assert!(!state.sessions.contains("abc"));
    }
}
