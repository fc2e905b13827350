use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use solarwatch_core::PanelId;
use solarwatch_status::{StatusClassifier, assess_prediction, notifications, sort_newest_first};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::RequestContext;

const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_HISTORY_LIMIT: usize = 100;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_panels))
        .route("/:id", get(get_panel))
        .route("/:id/history", get(get_history))
}

pub(crate) fn parse_panel_id(raw: &str) -> Result<PanelId, axum::response::Response> {
    PanelId::new(raw)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

pub async fn list_panels(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    let snapshots = match services.backend().list_panels(ctx.session()).await {
        Ok(s) => s,
        Err(e) => return errors::backend_error_to_response(e),
    };

    let classifier = StatusClassifier::new(ctx.locale());
    let panels: Vec<dto::PanelView> = snapshots
        .into_iter()
        .map(|snapshot| dto::PanelView {
            classification: classifier.classify(&snapshot),
            snapshot,
        })
        .collect();

    Json(dto::FleetView {
        count: panels.len(),
        panels,
    })
    .into_response()
}

pub async fn get_panel(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let panel_id = match parse_panel_id(&id) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let state = match services.panel_state(ctx.session(), &panel_id).await {
        Ok(s) => s,
        Err(e) => return errors::backend_error_to_response(e),
    };

    let classification = StatusClassifier::new(ctx.locale()).classify(&state.snapshot);
    services.publish_if_fresh(&state.snapshot, &classification);

    Json(dto::PanelDetailView {
        notifications: notifications(&state.snapshot, &classification, ctx.locale()),
        snapshot: state.snapshot,
        classification,
    })
    .into_response()
}

pub async fn get_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::HistoryQuery>,
) -> axum::response::Response {
    let panel_id = match parse_panel_id(&id) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let mut records = match services
        .backend()
        .prediction_history(ctx.session(), &panel_id, limit)
        .await
    {
        Ok(r) => r,
        Err(e) => return errors::backend_error_to_response(e),
    };
    sort_newest_first(&mut records);

    let predictions: Vec<dto::PredictionView> = records
        .into_iter()
        .map(|record| {
            let assessment = assess_prediction(&record);
            services.suspicious().record(&record, &assessment);
            dto::PredictionView { assessment, record }
        })
        .collect();
    let suspicious = predictions
        .iter()
        .filter(|p| p.assessment.is_suspicious)
        .count();

    Json(dto::HistoryView {
        panel_id: panel_id.to_string(),
        summary: dto::HistorySummary {
            count: predictions.len(),
            suspicious,
            suspicious_accumulated: services.suspicious().accumulated(),
            retraining_threshold: services.suspicious().threshold(),
            retraining_recommended: services.suspicious().retraining_recommended(),
        },
        predictions,
    })
    .into_response()
}
