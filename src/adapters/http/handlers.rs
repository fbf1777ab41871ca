//! HTTP handlers for operational endpoints.

use axum::{extract::State, Json};

use crate::adapters::websocket::WebSocketState;

use super::dto::HealthResponse;

/// GET /health - Liveness plus the number of live subscriber connections.
pub async fn health(State(state): State<WebSocketState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.registry.len(),
    })
}
