//! Test fixtures for snapshots, game content and wired-up components.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use sp_core::client::{AnswerChecker, ProgressSource, ScriptedBackend, SourceResult};
use sp_core::game::{GameContent, GameSession};
use sp_core::pipeline::PipelineReconciler;
use sp_core::store::SessionStore;
use sp_protocol::blueprint_models::{
    GameBlueprint, MultipleChoiceStoryBlueprint, QuestionPrompt, VisualizationDescriptor,
};
use sp_protocol::config_models::{GameSettings, PollSettings};
use sp_protocol::ipc::Event;
use sp_protocol::pipeline_models::{ProgressSnapshot, RunId, RunStatus, StepRecord, StepStatus};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Large enough that no test blocks on a full event channel.
pub const EVENT_BUFFER: usize = 1024;

pub fn step(number: u32, name: &str, status: StepStatus) -> StepRecord {
    StepRecord {
        id: format!("step-{number}"),
        step_number: number,
        step_name: name.to_string(),
        status,
        error_message: None,
        retry_count: 0,
        started_at: None,
        completed_at: None,
        validation_result: None,
    }
}

pub fn processing(progress: Value) -> ProgressSnapshot {
    ProgressSnapshot {
        status: RunStatus::Processing,
        progress: Some(progress),
        ..Default::default()
    }
}

pub fn completed(visualization_id: &str) -> ProgressSnapshot {
    ProgressSnapshot {
        status: RunStatus::Completed,
        progress: Some(json!(100)),
        visualization_id: Some(visualization_id.to_string()),
        ..Default::default()
    }
}

pub fn failed(status: RunStatus, message: Option<&str>) -> ProgressSnapshot {
    ProgressSnapshot {
        status,
        error_message: message.map(str::to_string),
        ..Default::default()
    }
}

pub fn poll_settings(max_attempts: u32, server_error_threshold: u32) -> PollSettings {
    PollSettings {
        interval_ms: 2000,
        max_attempts,
        server_error_threshold,
        request_timeout_ms: 30_000,
    }
}

/// A backend that accepts every poll and never answers it.
#[derive(Default)]
pub struct StalledBackend {
    polls: AtomicU32,
}

impl StalledBackend {
    pub fn poll_count(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProgressSource for StalledBackend {
    async fn start_run(&self, _content_id: &str) -> SourceResult<RunId> {
        Ok(RunId::new("stalled-run"))
    }

    async fn poll_progress(&self, _run_id: &RunId) -> SourceResult<ProgressSnapshot> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn retry_step(&self, _step_id: &str) -> SourceResult<()> {
        Ok(())
    }
}

/// A reconciler over any progress source, with a fresh store and channel.
pub fn reconciler_over(
    source: Arc<dyn ProgressSource>,
    settings: PollSettings,
) -> (PipelineReconciler, Arc<SessionStore>, mpsc::Receiver<Event>) {
    let store = Arc::new(SessionStore::new(9));
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let reconciler = PipelineReconciler::new(source, Arc::clone(&store), settings, events_tx);
    (reconciler, store, events_rx)
}

/// A reconciler over `backend` with a fresh store and event channel.
pub fn reconciler_with(
    backend: ScriptedBackend,
    settings: PollSettings,
) -> (
    PipelineReconciler,
    Arc<ScriptedBackend>,
    Arc<SessionStore>,
    mpsc::Receiver<Event>,
) {
    let backend = Arc::new(backend);
    let source: Arc<dyn ProgressSource> = backend.clone();
    let store = Arc::new(SessionStore::new(9));
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let reconciler = PipelineReconciler::new(source, Arc::clone(&store), settings, events_tx);
    (reconciler, backend, store, events_rx)
}

/// A multiple-choice story with `count` two-option questions.
pub fn multiple_choice_blueprint(count: u32) -> GameBlueprint {
    GameBlueprint::MultipleChoiceStory(MultipleChoiceStoryBlueprint {
        title: "The lost sailor".to_string(),
        narrative_intro: "Navigate home using the stars.".to_string(),
        question_flow: (1..=count)
            .map(|n| QuestionPrompt {
                question_number: n,
                prompt: format!("Question {n}?"),
                options: vec!["A".to_string(), "B".to_string()],
            })
            .collect(),
        visualization: VisualizationDescriptor::default(),
    })
}

pub fn multiple_choice_document(count: u32) -> Value {
    serde_json::to_value(multiple_choice_blueprint(count)).unwrap_or(Value::Null)
}

/// A game over `count` questions, answered from `backend`.
pub fn game_with(
    backend: ScriptedBackend,
    count: u32,
) -> (
    GameSession,
    Arc<ScriptedBackend>,
    Arc<SessionStore>,
    mpsc::Receiver<Event>,
) {
    let backend = Arc::new(backend);
    let checker: Arc<dyn AnswerChecker> = backend.clone();
    let store = Arc::new(SessionStore::new(9));
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let session = GameSession::from_content(
        "v1",
        GameContent::Blueprint(multiple_choice_blueprint(count)),
        checker,
        Arc::clone(&store),
        GameSettings::default(),
        events_tx,
    );
    (session, backend, store, events_rx)
}

/// Everything currently buffered on the channel.
pub fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
