//! Consistent error responses: `{"error": code, "message": text}`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use solarwatch_backend::BackendError;
use solarwatch_status::PreconditionError;

pub fn backend_error_to_response(err: BackendError) -> axum::response::Response {
    match err {
        BackendError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")),
        BackendError::Unauthorized(detail) => json_error(
            StatusCode::UNAUTHORIZED,
            "upstream_unauthorized",
            format!("backend refused the bearer token: {detail}"),
        ),
        BackendError::Forbidden(detail) => json_error(
            StatusCode::FORBIDDEN,
            "upstream_forbidden",
            format!("backend denied access: {detail}"),
        ),
        BackendError::Unavailable(msg) => json_error(StatusCode::BAD_GATEWAY, "upstream_unavailable", msg),
        BackendError::Rejected { status, detail } => json_error(
            StatusCode::BAD_GATEWAY,
            "upstream_rejected",
            format!("backend answered {status}: {detail}"),
        ),
        BackendError::Decode(msg) => json_error(StatusCode::BAD_GATEWAY, "upstream_malformed", msg),
        BackendError::Adapter(e) => json_error(StatusCode::BAD_GATEWAY, "upstream_malformed", e.to_string()),
        BackendError::Config(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "misconfigured", msg),
    }
}

pub fn precondition_error_to_response(err: PreconditionError) -> axum::response::Response {
    let status = match err {
        PreconditionError::NoValidationPending | PreconditionError::PanelMismatch { .. } => {
            StatusCode::CONFLICT
        }
        PreconditionError::CorrectionRequired
        | PreconditionError::NothingToConfirm
        | PreconditionError::CorrectionMatchesPrediction => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
