//! HTTP adapter - the service's axum router.

mod dto;
mod handlers;
mod routes;

pub use dto::HealthResponse;
pub use routes::delta_router;
