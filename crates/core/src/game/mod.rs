//! Game sessions over a completed visualization.

pub mod content;
pub mod session;

pub use content::{GameContent, QuestionView};
pub use session::{GamePhase, GameSession};

use crate::client::SourceError;
use crate::render::BlueprintError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    /// No visualization id was handed over; the pipeline flow never finished.
    #[error("No visualization to play; run the pipeline first")]
    MissingVisualization,

    #[error("Failed to load visualization '{id}': {source}")]
    Load { id: String, source: SourceError },

    #[error(transparent)]
    Blueprint(#[from] BlueprintError),

    #[error("Answer check failed: {0}")]
    AnswerCheck(SourceError),

    #[error("No answer selected")]
    NoSelection,

    #[error("Cannot {operation} while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: &'static str,
    },

    #[error("Game session was cancelled")]
    Cancelled,
}

pub type GameResult<T> = Result<T, GameError>;
