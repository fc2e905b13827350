use axum::{Router, routing::get};

pub mod panels;
pub mod system;
pub mod validation;

/// Router for all endpoints behind the bearer-token middleware.
pub fn router() -> Router {
    Router::new()
        .route("/stream", get(system::stream))
        .route("/backend/health", get(system::backend_health))
        .nest("/panels", panels::router().merge(validation::router()))
}
