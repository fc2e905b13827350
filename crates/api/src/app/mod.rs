//! HTTP application wiring.
//!
//! - `services.rs`: backend selection, realtime channel, panel state lookup
//! - `poller.rs`: background fleet poller feeding the realtime channel
//! - `retraining.rs`: accumulated suspicious predictions
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware::{self, ContextState};

pub mod dto;
pub mod errors;
pub mod poller;
pub mod retraining;
pub mod routes;
pub mod services;

/// Build the full HTTP router around already-wired services.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let context_state = ContextState {
        default_locale: services.default_locale(),
    };

    // Protected routes: require a bearer token, carry a request context.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            context_state,
            middleware::context_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}

pub use services::AppServices;
