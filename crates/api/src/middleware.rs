use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};

use solarwatch_backend::SessionContext;
use solarwatch_status::Locale;

use crate::app::errors::json_error;
use crate::context::RequestContext;

#[derive(Debug, Clone, Copy)]
pub struct ContextState {
    pub default_locale: Locale,
}

/// Require a bearer token and attach the [`RequestContext`].
///
/// The token is not validated here; the backend owns authentication.
pub async fn context_middleware(
    State(state): State<ContextState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Some(token) => token.to_string(),
        None => {
            return json_error(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "missing or malformed bearer token",
            );
        }
    };

    let locale = req
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(Locale::from_accept_language)
        .unwrap_or(state.default_locale);

    req.extensions_mut()
        .insert(RequestContext::new(SessionContext::with_bearer(token), locale));

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
