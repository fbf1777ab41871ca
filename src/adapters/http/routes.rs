//! Axum router for the delta stream service.

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::adapters::websocket::{ws_handler, WebSocketState};

use super::handlers::health;

/// Create the service router.
///
/// # Routes
/// - `GET /health` - Liveness and live connection count
/// - `GET /ws/delta?token=<bearer>` - Subscriber WebSocket upgrade
///
/// An empty `cors_origins` list allows any origin (development).
pub fn delta_router(state: WebSocketState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws/delta", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any)
    } else {
        CorsLayer::new().allow_origin(allowed).allow_methods(Any)
    }
}
