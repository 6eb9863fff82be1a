//! Game session state machine.
//!
//! A session walks the player through every question of one visualization:
//!
//! ```text
//! load ──> Answering ──submit──> Feedback ──delay──> Answering
//!                                    │
//!                                    └──delay (last question)──> Complete
//! ```
//!
//! Loading is the [`GameSession::load`] future itself: a session value only
//! exists once its content resolved. Scoring happens exactly once per
//! question, when the answer check succeeds.

use super::content::{GameContent, QuestionView};
use super::{GameError, GameResult};
use crate::client::{AnswerChecker, VisualizationSource};
use crate::store::{FinalResult, ScratchKey, SessionStore};
use sp_protocol::config_models::GameSettings;
use sp_protocol::game_models::{AnswerCheckRequest, AnswerRecord};
use sp_protocol::ipc::Event;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Answering,
    Feedback { is_correct: bool },
    Complete { score: u32, total_questions: usize },
}

impl GamePhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Answering => "answering",
            Self::Feedback { .. } => "showing feedback",
            Self::Complete { .. } => "complete",
        }
    }
}

pub struct GameSession {
    session_id: Uuid,
    visualization_id: String,
    content: GameContent,
    total_questions: usize,
    question_index: usize,
    score: u32,
    answers: Vec<AnswerRecord>,
    selected_answer: Option<String>,
    feedback_visible: bool,
    phase: GamePhase,
    feedback_delay: Duration,
    checker: Arc<dyn AnswerChecker>,
    store: Arc<SessionStore>,
    events_tx: Sender<Event>,
    cancel: CancellationToken,
}

impl GameSession {
    /// Load the visualization handed over by the pipeline and open a session.
    ///
    /// # Errors
    ///
    /// - [`GameError::MissingVisualization`] when the scratchpad holds no
    ///   visualization id, meaning the pipeline flow never completed.
    /// - [`GameError::Load`] when the visualization cannot be fetched.
    /// - [`GameError::Blueprint`] when the blueprint is unsupported or malformed.
    #[instrument(skip_all)]
    pub async fn load(
        source: &dyn VisualizationSource,
        checker: Arc<dyn AnswerChecker>,
        store: Arc<SessionStore>,
        settings: GameSettings,
        events_tx: Sender<Event>,
    ) -> GameResult<Self> {
        let visualization_id = store
            .scratch()
            .get(ScratchKey::VisualizationId)
            .filter(|id| !id.trim().is_empty())
            .ok_or(GameError::MissingVisualization)?;

        debug!(%visualization_id, "fetching visualization");
        let response = source
            .fetch_visualization(&visualization_id)
            .await
            .map_err(|err| GameError::Load {
                id: visualization_id.clone(),
                source: err,
            })?;
        let content = GameContent::resolve(response)?;

        let session = Self::from_content(visualization_id, content, checker, store, settings, events_tx);
        info!(
            session_id = %session.session_id,
            total_questions = session.total_questions,
            "game loaded"
        );
        let _ = session
            .events_tx
            .send(Event::GameLoaded {
                session_id: session.session_id,
                total_questions: session.total_questions,
            })
            .await;
        Ok(session)
    }

    /// Open a session over content that is already resolved.
    pub fn from_content(
        visualization_id: impl Into<String>,
        content: GameContent,
        checker: Arc<dyn AnswerChecker>,
        store: Arc<SessionStore>,
        settings: GameSettings,
        events_tx: Sender<Event>,
    ) -> Self {
        let total_questions = content.question_count();
        let cancel = store.cancellation_token();
        Self {
            session_id: store.session_id(),
            visualization_id: visualization_id.into(),
            content,
            total_questions,
            question_index: 0,
            score: 0,
            answers: Vec::new(),
            selected_answer: None,
            feedback_visible: false,
            phase: GamePhase::Answering,
            feedback_delay: settings.feedback_delay(),
            checker,
            store,
            events_tx,
            cancel,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn visualization_id(&self) -> &str {
        &self.visualization_id
    }

    pub fn content(&self) -> &GameContent {
        &self.content
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    /// 1-based number of the current question.
    pub fn question_number(&self) -> u32 {
        u32::try_from(self.question_index + 1).unwrap_or(u32::MAX)
    }

    pub fn current_question(&self) -> Option<QuestionView> {
        self.content.question(self.question_index)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn selected_answer(&self) -> Option<&str> {
        self.selected_answer.as_deref()
    }

    pub fn feedback_visible(&self) -> bool {
        self.feedback_visible
    }

    /// Share of the quiz reached, counting the current question.
    pub fn progress_fraction(&self) -> f64 {
        (self.question_index + 1) as f64 / self.total_questions as f64
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn select_answer(&mut self, value: impl Into<String>) -> GameResult<()> {
        self.require_answering("select an answer")?;
        self.selected_answer = Some(value.into());
        Ok(())
    }

    /// Check the selected answer and move to feedback.
    ///
    /// On failure nothing changes and the same or another selection can be
    /// submitted again.
    pub async fn submit_answer(&mut self) -> GameResult<AnswerRecord> {
        self.require_answering("submit an answer")?;
        let selected_answer = self.selected_answer.clone().ok_or(GameError::NoSelection)?;

        let request = AnswerCheckRequest {
            question_number: self.question_number(),
            selected_answer,
        };
        debug!(question_number = request.question_number, "checking answer");
        let result = self
            .checker
            .check_answer(&self.visualization_id, &request)
            .await;

        if self.cancel.is_cancelled() {
            debug!("discarding answer check after cancellation");
            return Err(GameError::Cancelled);
        }
        let response = result.map_err(|e| {
            warn!(error = %e, question_number = request.question_number, "answer check failed");
            GameError::AnswerCheck(e)
        })?;

        let record = AnswerRecord {
            question_number: request.question_number,
            selected_answer: request.selected_answer,
            is_correct: response.is_correct,
        };
        if record.is_correct {
            self.score += 1;
        }
        self.answers.push(record.clone());
        self.feedback_visible = true;
        self.phase = GamePhase::Feedback {
            is_correct: record.is_correct,
        };

        info!(
            question_number = record.question_number,
            is_correct = record.is_correct,
            score = self.score,
            "answer checked"
        );
        let _ = self
            .events_tx
            .send(Event::AnswerChecked {
                question_number: record.question_number,
                is_correct: record.is_correct,
                score: self.score,
            })
            .await;
        Ok(record)
    }

    /// Wait out the feedback delay, then move on to the next question or
    /// complete the session.
    pub async fn auto_advance(&mut self) -> GameResult<GamePhase> {
        if !matches!(self.phase, GamePhase::Feedback { .. }) {
            return Err(self.invalid("advance"));
        }

        tokio::select! {
            _ = self.cancel.cancelled() => return Err(GameError::Cancelled),
            _ = tokio::time::sleep(self.feedback_delay) => {}
        }

        self.advance().await;
        Ok(self.phase)
    }

    /// Stop the pending feedback timer and any answer check in flight.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    async fn advance(&mut self) {
        self.feedback_visible = false;

        if self.question_index + 1 < self.total_questions {
            self.question_index += 1;
            self.selected_answer = None;
            self.phase = GamePhase::Answering;
            debug!(question_index = self.question_index, "next question");
            let _ = self
                .events_tx
                .send(Event::QuestionAdvanced {
                    question_index: self.question_index,
                })
                .await;
            return;
        }

        self.phase = GamePhase::Complete {
            score: self.score,
            total_questions: self.total_questions,
        };
        self.store.scratch().record_result(FinalResult {
            score: self.score,
            total_questions: self.total_questions,
        });
        info!(
            session_id = %self.session_id,
            score = self.score,
            total_questions = self.total_questions,
            "game complete"
        );
        let _ = self
            .events_tx
            .send(Event::GameCompleted {
                session_id: self.session_id,
                score: self.score,
                total_questions: self.total_questions,
            })
            .await;
    }

    fn require_answering(&self, operation: &'static str) -> GameResult<()> {
        match self.phase {
            GamePhase::Answering => Ok(()),
            _ => Err(self.invalid(operation)),
        }
    }

    fn invalid(&self, operation: &'static str) -> GameError {
        GameError::InvalidTransition {
            operation,
            phase: self.phase.name(),
        }
    }
}
