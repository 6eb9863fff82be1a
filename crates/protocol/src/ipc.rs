//! Core-to-presentation communication protocol.
//!
//! The core runs the pipeline reconciler and the game session as
//! asynchronous tasks and reports every visible state change as an
//! [`Event`] over a channel, so presentation never polls the core.
//!
//! Terminal events (`RunCompleted`, `RunFailed`, `GameCompleted`) are sent
//! at most once per run or session.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::pipeline_models::{RunId, RunStatus};

/// Events sent from the Core logic to presentation.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "runProgress",
///   "payload": {
///     "run_id": "1f0c...",
///     "status": "processing",
///     "progress": 40,
///     "current_step": "story_generation"
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// Polling has begun for a run.
    RunStarted { run_id: RunId },

    /// A poll was applied to the session store.
    RunProgress {
        run_id: RunId,
        status: RunStatus,
        progress: u8,
        current_step: Option<String>,
    },

    /// The run finished and produced a visualization.
    RunCompleted {
        run_id: RunId,
        visualization_id: String,
    },

    /// The run failed, was reported broken, or took too long.
    RunFailed { run_id: RunId, error: String },

    /// A game session finished loading its content.
    GameLoaded {
        #[ts(type = "string")]
        session_id: Uuid,
        total_questions: usize,
    },

    /// The answer to the current question was checked.
    AnswerChecked {
        question_number: u32,
        is_correct: bool,
        score: u32,
    },

    /// Feedback timed out and the next question is up.
    QuestionAdvanced { question_index: usize },

    /// Every question has been answered.
    GameCompleted {
        #[ts(type = "string")]
        session_id: Uuid,
        score: u32,
        total_questions: usize,
    },
}
