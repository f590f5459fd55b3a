//! Axum router configuration with middleware.
//!
//! Middleware: CORS, request tracing.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/{client_id}", get(handlers::ws::ws_handler))
        .route(
            "/sessions/{client_id}",
            get(handlers::session::get_session).delete(handlers::session::delete_session),
        )
        .route("/broadcast", post(handlers::broadcast::broadcast))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness plus live connection and session counts.
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": state.connections.len(),
        "sessions": state.sessions.len(),
    }))
}
