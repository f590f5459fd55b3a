//! HTTP layer for chatrelay.
//!
//! Axum router serving the relay WebSocket at `/ws/{client_id}`, session
//! history endpoints, operator broadcast, and a health check.

pub mod error;
pub mod handlers;
pub mod router;
