//! Per-session scratchpad handing values between the pipeline and the game.
//!
//! Values are plain strings keyed by [`ScratchKey`]. The scratchpad lives as
//! long as the session and is cleared on reset.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScratchKey {
    ContentId,
    RunId,
    VisualizationId,
    FinalScore,
    TotalQuestions,
}

impl ScratchKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContentId => "contentId",
            Self::RunId => "runId",
            Self::VisualizationId => "visualizationId",
            Self::FinalScore => "finalScore",
            Self::TotalQuestions => "totalQuestions",
        }
    }
}

impl fmt::Display for ScratchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final result of a completed game, as handed to the results view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalResult {
    pub score: u32,
    pub total_questions: usize,
}

#[derive(Debug, Default)]
pub struct Scratchpad {
    values: Mutex<HashMap<ScratchKey, String>>,
}

impl Scratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: ScratchKey, value: impl Into<String>) {
        self.values.lock().insert(key, value.into());
    }

    pub fn get(&self, key: ScratchKey) -> Option<String> {
        self.values.lock().get(&key).cloned()
    }

    pub fn remove(&self, key: ScratchKey) -> Option<String> {
        self.values.lock().remove(&key)
    }

    pub fn clear(&self) {
        self.values.lock().clear();
    }

    /// Store the final score and question count together.
    pub fn record_result(&self, result: FinalResult) {
        let mut values = self.values.lock();
        values.insert(ScratchKey::FinalScore, result.score.to_string());
        values.insert(ScratchKey::TotalQuestions, result.total_questions.to_string());
    }

    /// Read back a result written by [`Scratchpad::record_result`].
    ///
    /// Returns `None` when either value is missing or unparsable.
    pub fn final_result(&self) -> Option<FinalResult> {
        let values = self.values.lock();
        let score = values.get(&ScratchKey::FinalScore)?.parse().ok()?;
        let total_questions = values.get(&ScratchKey::TotalQuestions)?.parse().ok()?;
        Some(FinalResult {
            score,
            total_questions,
        })
    }
}
