use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    response::{IntoResponse, sse::Event as SseEvent},
};
use serde::Deserialize;
use serde_json::json;

use solarwatch_core::PanelId;

use crate::app::errors;
use crate::app::services::{self, AppServices};
use crate::context::RequestContext;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    pub panel_id: Option<PanelId>,
}

/// `panel.classified` events; `?panel_id=` narrows to one panel.
pub async fn stream(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<StreamQuery>,
) -> axum::response::Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    services::panel_sse_stream(services, query.panel_id)
}

/// Relays the upstream health body.
pub async fn backend_health(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    match services.backend().health(ctx.session()).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}
