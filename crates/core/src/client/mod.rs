//! Backend collaborator contracts.
//!
//! The core never talks to the network directly. It consumes three
//! collaborators through the traits below so the state machines can be
//! driven by the HTTP backend in production and by scripted responses in
//! tests.
//!
//! Every failure is a [`SourceError`], and every `SourceError` belongs to one
//! [`FaultClass`] that decides how the poll loop reacts to it.

pub mod http;
pub mod scripted;

pub use http::HttpBackend;
pub use scripted::ScriptedBackend;

use async_trait::async_trait;
use sp_protocol::game_models::{AnswerCheckRequest, AnswerCheckResponse, VisualizationResponse};
use sp_protocol::pipeline_models::{ProgressSnapshot, RunId};
use thiserror::Error;

/// How the poll loop treats a failed round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// Connection reset or socket closed; retried silently.
    Transient,
    /// The run is not known yet; still initializing.
    NotYetAvailable,
    /// 5xx from the backend; escalated only when it keeps happening.
    ServerFault,
    /// 4xx other than 404. Counted with server faults so a poll the backend
    /// keeps refusing ends the run instead of running out the attempts.
    Rejected,
    /// Anything else the backend should not have sent; logged and retried.
    Unexpected,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Connection reset: {0}")]
    ConnectionReset(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

impl SourceError {
    pub fn class(&self) -> FaultClass {
        match self {
            Self::ConnectionReset(_) | Self::Transport(_) => FaultClass::Transient,
            Self::NotFound(_) => FaultClass::NotYetAvailable,
            Self::Server { .. } => FaultClass::ServerFault,
            Self::Rejected { .. } => FaultClass::Rejected,
            Self::Decode(_) => FaultClass::Unexpected,
        }
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Backend job queue running the transformation pipeline.
#[async_trait]
pub trait ProgressSource: Send + Sync {
    /// Start a pipeline run for an uploaded content item.
    async fn start_run(&self, content_id: &str) -> SourceResult<RunId>;

    /// Fetch the current status of a run. Must be safe to call every two seconds.
    async fn poll_progress(&self, run_id: &RunId) -> SourceResult<ProgressSnapshot>;

    /// Ask the backend to re-run one step. The effect shows up on a later poll.
    async fn retry_step(&self, step_id: &str) -> SourceResult<()>;
}

#[async_trait]
pub trait AnswerChecker: Send + Sync {
    async fn check_answer(
        &self,
        visualization_id: &str,
        request: &AnswerCheckRequest,
    ) -> SourceResult<AnswerCheckResponse>;
}

#[async_trait]
pub trait VisualizationSource: Send + Sync {
    async fn fetch_visualization(&self, visualization_id: &str)
        -> SourceResult<VisualizationResponse>;
}
