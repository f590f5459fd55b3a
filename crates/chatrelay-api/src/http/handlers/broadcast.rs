//! Operator broadcast to every live connection.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use chatrelay_types::frame::OutboundFrame;

use crate::http::error::AppError;
use crate::state::AppState;

/// Request body for `POST /broadcast`.
#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    pub content: String,
}

/// Number of connections the broadcast frame was queued for.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BroadcastResponse {
    pub delivered: usize,
}

/// POST /broadcast - Push a `broadcast` frame to every connected client.
///
/// Best-effort: clients whose queue is full or closed are skipped.
pub async fn broadcast(
    State(state): State<AppState>,
    Json(body): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, AppError> {
    if body.content.trim().is_empty() {
        return Err(AppError::Validation(
            "broadcast content must not be empty".to_string(),
        ));
    }

    let frame = OutboundFrame::Broadcast {
        content: body.content,
    };
    let delivered = state.connections.broadcast_all(&frame);
    tracing::info!(
        delivered,
        connections = state.connections.len(),
        "Broadcast sent"
    );

    Ok(Json(BroadcastResponse { delivered }))
}
