use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::post,
};
use tracing::{info, warn};

use solarwatch_backend::CleaningCommand;
use solarwatch_status::{StatusClassifier, ValidationDecision, ValidationGate};

use crate::app::routes::panels::parse_panel_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new().route("/:id/validation", post(submit_validation))
}

/// Resolve a pending human validation.
///
/// Feedback must reach the backend for the request to succeed; the cleaning
/// command is best-effort and reported through `command_dispatched`.
pub async fn submit_validation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ValidationRequest>,
) -> axum::response::Response {
    let panel_id = match parse_panel_id(&id) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let state = match services.panel_state(ctx.session(), &panel_id).await {
        Ok(s) => s,
        Err(e) => return errors::backend_error_to_response(e),
    };
    let prior = StatusClassifier::new(ctx.locale()).classify(&state.snapshot);

    let decision = ValidationDecision {
        panel_id,
        prediction_id: body
            .prediction_id
            .or_else(|| state.latest_prediction.and_then(|p| p.id)),
        is_correct: body.is_correct,
        corrected_class: body.corrected_class,
    };

    let outcome = match ValidationGate::evaluate(&decision, &prior) {
        Ok(o) => o,
        Err(e) => return errors::precondition_error_to_response(e),
    };

    if let Err(e) = services
        .backend()
        .submit_feedback(ctx.session(), &outcome.feedback)
        .await
    {
        return errors::backend_error_to_response(e);
    }
    info!(
        panel_id = %decision.panel_id,
        is_correct = decision.is_correct,
        resolved = outcome.resolved_status.as_str(),
        "validation feedback submitted"
    );

    let command = CleaningCommand::from_outcome(&outcome);
    let command_dispatched = match services
        .backend()
        .send_cleaning_command(ctx.session(), &command)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            warn!(panel_id = %command.device_id, error = %e, "cleaning command not dispatched");
            false
        }
    };

    Json(dto::ValidationResponse {
        outcome,
        command_dispatched,
    })
    .into_response()
}
