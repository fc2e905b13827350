//! reqwest client for the external panel backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use solarwatch_core::PanelId;
use solarwatch_status::{FeedbackRecord, PanelSnapshot, PredictionRecord};

use crate::client::{BackendError, CleaningCommand, PanelBackend};
use crate::payload::{adapt_panel, adapt_panels, adapt_predictions, list_items};
use crate::session::SessionContext;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpPanelBackend {
    base_url: Url,
    client: Client,
}

impl HttpPanelBackend {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| BackendError::Config(format!("backend url {base_url:?}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(BackendError::Config(format!(
                "backend url {base_url:?} cannot carry a path"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;
        Ok(Self {
            base_url: parsed,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Config(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, session: &SessionContext) -> RequestBuilder {
        let req = self.client.request(method, url);
        match session.bearer_token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response, BackendError> {
        let resp = req.send().await.map_err(|e| {
            warn!(error = %e, what, "backend request failed");
            BackendError::Unavailable(e.to_string())
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let detail = error_detail(resp).await;
        debug!(%status, what, detail = %detail, "backend returned an error");
        Err(status_error(status, what, detail))
    }

    async fn get_json(
        &self,
        session: &SessionContext,
        segments: &[&str],
        query: &[(&str, String)],
        what: &str,
    ) -> Result<Value, BackendError> {
        let url = self.endpoint(segments)?;
        let req = self.request(Method::GET, url, session).query(query);
        let resp = self.send(req, what).await?;
        resp.json::<Value>()
            .await
            .map_err(|e| BackendError::Decode(format!("{what}: {e}")))
    }

    async fn post_json<T: Serialize + Sync>(
        &self,
        session: &SessionContext,
        segments: &[&str],
        body: &T,
        what: &str,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(segments)?;
        let req = self.request(Method::POST, url, session).json(body);
        self.send(req, what).await?;
        Ok(())
    }
}

fn status_error(status: StatusCode, what: &str, detail: String) -> BackendError {
    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound(what.to_string()),
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized(detail),
        StatusCode::FORBIDDEN => BackendError::Forbidden(detail),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            BackendError::Unavailable(format!("{status}: {detail}"))
        }
        _ => BackendError::Rejected {
            status: status.as_u16(),
            detail,
        },
    }
}

/// `detail` of a `{"detail": ...}` body, else the raw body, else the reason phrase.
async fn error_detail(resp: Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        },
        _ => None,
    };
    detail
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string())
}

#[async_trait]
impl PanelBackend for HttpPanelBackend {
    async fn list_panels(&self, session: &SessionContext) -> Result<Vec<PanelSnapshot>, BackendError> {
        let body = self.get_json(session, &["panels"], &[], "panel list").await?;
        let items = list_items(body, &["panels", "data"])
            .ok_or_else(|| BackendError::Decode("panel list: expected an array".to_string()))?;
        Ok(adapt_panels(items))
    }

    async fn get_panel(
        &self,
        session: &SessionContext,
        panel_id: &PanelId,
    ) -> Result<PanelSnapshot, BackendError> {
        let what = format!("panel {panel_id}");
        let body = self
            .get_json(session, &["panels", panel_id.as_str()], &[], &what)
            .await?;
        Ok(adapt_panel(body)?)
    }

    async fn prediction_history(
        &self,
        session: &SessionContext,
        panel_id: &PanelId,
        limit: usize,
    ) -> Result<Vec<PredictionRecord>, BackendError> {
        let what = format!("history of panel {panel_id}");
        let body = self
            .get_json(
                session,
                &["history", "panel", panel_id.as_str()],
                &[("limit", limit.to_string())],
                &what,
            )
            .await?;
        let items = list_items(body, &["predictions", "history", "data"])
            .ok_or_else(|| BackendError::Decode(format!("{what}: expected an array")))?;
        let mut records = adapt_predictions(items);
        records.truncate(limit);
        Ok(records)
    }

    async fn submit_feedback(
        &self,
        session: &SessionContext,
        feedback: &FeedbackRecord,
    ) -> Result<(), BackendError> {
        self.post_json(session, &["feedback"], feedback, "feedback").await
    }

    async fn send_cleaning_command(
        &self,
        session: &SessionContext,
        command: &CleaningCommand,
    ) -> Result<(), BackendError> {
        self.post_json(session, &["mqtt", "cleaning-command"], command, "cleaning command")
            .await
    }

    async fn health(&self, session: &SessionContext) -> Result<Value, BackendError> {
        self.get_json(session, &["health"], &[], "health").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_joined_and_encoded() {
        let backend = HttpPanelBackend::new("http://backend:8000/api/").unwrap();
        let url = backend.endpoint(&["history", "panel", "P 1/a"]).unwrap();
        assert_eq!(url.as_str(), "http://backend:8000/api/history/panel/P%201%2Fa");

        let backend = HttpPanelBackend::new("http://backend:8000").unwrap();
        let url = backend.endpoint(&["mqtt", "cleaning-command"]).unwrap();
        assert_eq!(url.as_str(), "http://backend:8000/mqtt/cleaning-command");
    }

    #[test]
    fn bad_base_urls_are_config_errors() {
        assert!(matches!(HttpPanelBackend::new("not a url"), Err(BackendError::Config(_))));
        assert!(matches!(HttpPanelBackend::new("mailto:ops@example.com"), Err(BackendError::Config(_))));
    }

    #[test]
    fn auth_failures_keep_their_meaning() {
        let err = |status| status_error(status, "panel P-1", "token expired".to_string());
        assert!(matches!(err(StatusCode::UNAUTHORIZED), BackendError::Unauthorized(d) if d == "token expired"));
        assert!(matches!(err(StatusCode::FORBIDDEN), BackendError::Forbidden(_)));
        assert!(matches!(err(StatusCode::NOT_FOUND), BackendError::NotFound(w) if w == "panel P-1"));
        assert!(matches!(err(StatusCode::SERVICE_UNAVAILABLE), BackendError::Unavailable(_)));
        assert!(matches!(
            err(StatusCode::UNPROCESSABLE_ENTITY),
            BackendError::Rejected { status: 422, .. }
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        let backend =
            HttpPanelBackend::with_timeout("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = backend.list_panels(&SessionContext::anonymous()).await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
    }
}
