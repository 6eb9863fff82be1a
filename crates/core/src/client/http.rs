//! HTTP implementation of the backend collaborators.
//!
//! Talks to the storyplay API:
//! - `POST /api/process/{content_id}` starts a run
//! - `GET  /api/progress/{run_id}` polls it
//! - `POST /api/pipeline/retry/{step_id}` retries a step
//! - `GET  /api/visualization/{id}` fetches game content
//! - `POST /api/check-answer/{visualization_id}` checks an answer

use super::{AnswerChecker, ProgressSource, SourceError, SourceResult, VisualizationSource};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use sp_protocol::config_models::ClientConfig;
use sp_protocol::game_models::{AnswerCheckRequest, AnswerCheckResponse, VisualizationResponse};
use sp_protocol::pipeline_models::{ProgressSnapshot, RunId, StartRunResponse};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a backend whose requests give up after `request_timeout`.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SourceError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> SourceResult<Self> {
        Self::new(config.api_base_url.clone(), config.poll.request_timeout())
    }

    /// Build `{base}/api/{segments...}` with each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> SourceResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SourceError::Transport(format!("invalid api base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Transport("api base url cannot be a base".to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> SourceResult<T> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> SourceResult<String> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(error_for_status(status.as_u16(), &body))
        }
    }
}

#[async_trait]
impl ProgressSource for HttpBackend {
    async fn start_run(&self, content_id: &str) -> SourceResult<RunId> {
        let url = self.endpoint(&["process", content_id])?;
        debug!(%url, "starting pipeline run");
        let response: StartRunResponse = self.send_json(self.client.post(url)).await?;
        Ok(response.run_id)
    }

    async fn poll_progress(&self, run_id: &RunId) -> SourceResult<ProgressSnapshot> {
        let url = self.endpoint(&["progress", run_id.as_str()])?;
        self.send_json(self.client.get(url)).await
    }

    async fn retry_step(&self, step_id: &str) -> SourceResult<()> {
        let url = self.endpoint(&["pipeline", "retry", step_id])?;
        self.send(self.client.post(url)).await.map(|_| ())
    }
}

#[async_trait]
impl AnswerChecker for HttpBackend {
    async fn check_answer(
        &self,
        visualization_id: &str,
        request: &AnswerCheckRequest,
    ) -> SourceResult<AnswerCheckResponse> {
        let url = self.endpoint(&["check-answer", visualization_id])?;
        self.send_json(self.client.post(url).json(request)).await
    }
}

#[async_trait]
impl VisualizationSource for HttpBackend {
    async fn fetch_visualization(
        &self,
        visualization_id: &str,
    ) -> SourceResult<VisualizationResponse> {
        let url = self.endpoint(&["visualization", visualization_id])?;
        self.send_json(self.client.get(url)).await
    }
}

fn map_transport_error(err: reqwest::Error) -> SourceError {
    if err.is_decode() {
        return SourceError::Decode(err.to_string());
    }
    let message = err.to_string();
    if err.is_connect() || err.is_timeout() || looks_like_reset(&message) {
        warn!(error = %message, "backend connection lost");
        SourceError::ConnectionReset(message)
    } else {
        SourceError::Transport(message)
    }
}

fn looks_like_reset(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("connection reset") || lower.contains("socket hang up") || lower.contains("connection closed")
}

/// Map a non-success HTTP status and body onto the fault taxonomy.
///
/// FastAPI reports failures as `{"detail": "..."}`; the detail is preferred
/// over the raw body when present.
pub fn error_for_status(status: u16, body: &str) -> SourceError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        404 => SourceError::NotFound(message),
        500..=599 => SourceError::Server { status, message },
        _ => SourceError::Rejected { status, message },
    }
}
