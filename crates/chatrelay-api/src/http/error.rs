//! Application error type mapping to HTTP status codes.
//!
//! Error bodies use the `{"detail": "..."}` shape clients of the relay
//! already parse.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use chatrelay_types::error::SessionError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Session lookup errors.
    Session(SessionError),
    /// Request body failed validation.
    Validation(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Session(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::Session(SessionError::NotFound) => {
                (StatusCode::NOT_FOUND, "Chat session not found".to_string())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
