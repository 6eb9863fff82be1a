//! Scripted in-memory backend for testing.
//!
//! Responses are queued up front and handed out in order. Every call is
//! recorded so tests can assert on what the state machines asked for.

use super::{AnswerChecker, ProgressSource, SourceError, SourceResult, VisualizationSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use sp_protocol::game_models::{AnswerCheckRequest, AnswerCheckResponse, VisualizationResponse};
use sp_protocol::pipeline_models::{ProgressSnapshot, RunId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Default)]
pub struct ScriptedBackend {
    start: Mutex<Option<SourceResult<RunId>>>,
    polls: Mutex<VecDeque<SourceResult<ProgressSnapshot>>>,
    poll_count: AtomicU32,
    retried_steps: Mutex<Vec<String>>,
    retry_result: Mutex<Option<SourceError>>,
    answers: Mutex<VecDeque<SourceResult<bool>>>,
    answer_requests: Mutex<Vec<(String, AnswerCheckRequest)>>,
    visualization: Mutex<Option<SourceResult<VisualizationResponse>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(self, result: SourceResult<RunId>) -> Self {
        *self.start.lock() = Some(result);
        self
    }

    /// Queue poll responses. Once they run out every poll fails as transient.
    pub fn with_polls(self, polls: Vec<SourceResult<ProgressSnapshot>>) -> Self {
        self.polls.lock().extend(polls);
        self
    }

    pub fn with_retry_failure(self, error: SourceError) -> Self {
        *self.retry_result.lock() = Some(error);
        self
    }

    /// Queue answer-check outcomes (`Ok(is_correct)` or a fault).
    pub fn with_answers(self, answers: Vec<SourceResult<bool>>) -> Self {
        self.answers.lock().extend(answers);
        self
    }

    pub fn with_visualization(self, result: SourceResult<VisualizationResponse>) -> Self {
        *self.visualization.lock() = Some(result);
        self
    }

    pub fn poll_count(&self) -> u32 {
        self.poll_count.load(Ordering::SeqCst)
    }

    pub fn retried_steps(&self) -> Vec<String> {
        self.retried_steps.lock().clone()
    }

    pub fn answer_requests(&self) -> Vec<(String, AnswerCheckRequest)> {
        self.answer_requests.lock().clone()
    }
}

#[async_trait]
impl ProgressSource for ScriptedBackend {
    async fn start_run(&self, _content_id: &str) -> SourceResult<RunId> {
        self.start
            .lock()
            .clone()
            .unwrap_or_else(|| Ok(RunId::new("scripted-run")))
    }

    async fn poll_progress(&self, _run_id: &RunId) -> SourceResult<ProgressSnapshot> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::ConnectionReset("script exhausted".to_string())))
    }

    async fn retry_step(&self, step_id: &str) -> SourceResult<()> {
        self.retried_steps.lock().push(step_id.to_string());
        match self.retry_result.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AnswerChecker for ScriptedBackend {
    async fn check_answer(
        &self,
        visualization_id: &str,
        request: &AnswerCheckRequest,
    ) -> SourceResult<AnswerCheckResponse> {
        self.answer_requests
            .lock()
            .push((visualization_id.to_string(), request.clone()));
        let outcome = self
            .answers
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::Transport("no scripted answer".to_string())));
        outcome.map(|is_correct| AnswerCheckResponse { is_correct })
    }
}

#[async_trait]
impl VisualizationSource for ScriptedBackend {
    async fn fetch_visualization(
        &self,
        visualization_id: &str,
    ) -> SourceResult<VisualizationResponse> {
        self.visualization
            .lock()
            .clone()
            .unwrap_or_else(|| Err(SourceError::NotFound(visualization_id.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_polls_in_order_then_transient() {
        let backend = ScriptedBackend::new().with_polls(vec![
            Ok(ProgressSnapshot::default()),
            Err(SourceError::NotFound("not yet".to_string())),
        ]);
        let run = RunId::new("r");

        assert!(backend.poll_progress(&run).await.is_ok());
        assert!(matches!(
            backend.poll_progress(&run).await,
            Err(SourceError::NotFound(_))
        ));
        assert!(matches!(
            backend.poll_progress(&run).await,
            Err(SourceError::ConnectionReset(_))
        ));
        assert_eq!(backend.poll_count(), 3);
    }

    #[tokio::test]
    async fn test_scripted_answers_are_recorded() {
        let backend = ScriptedBackend::new().with_answers(vec![Ok(true)]);
        let request = AnswerCheckRequest {
            question_number: 1,
            selected_answer: "A".to_string(),
        };

        let response = backend.check_answer("v1", &request).await;
        assert_eq!(response, Ok(AnswerCheckResponse { is_correct: true }));
        assert_eq!(backend.answer_requests(), vec![("v1".to_string(), request)]);
    }
}
