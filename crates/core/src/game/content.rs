//! Playable content of a game session.

use crate::render::{resolve_blueprint, BlueprintResult};
use sp_protocol::blueprint_models::GameBlueprint;
use sp_protocol::game_models::{StoryData, VisualizationResponse};

/// Either a typed blueprint or a legacy HTML payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GameContent {
    Blueprint(GameBlueprint),
    Legacy { html: String, story: StoryData },
}

/// The question currently shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    /// 1-based, as sent to the answer checker.
    pub number: u32,
    pub prompt: String,
    pub options: Vec<String>,
}

impl GameContent {
    /// Resolve a visualization response. Unsupported blueprints fail here,
    /// before a session is created.
    pub fn resolve(response: VisualizationResponse) -> BlueprintResult<Self> {
        match response {
            VisualizationResponse::Blueprint { blueprint, .. } => {
                let resolved =
                    resolve_blueprint(&blueprint.blueprint, blueprint.template_type.as_deref())?;
                Ok(Self::Blueprint(resolved))
            }
            VisualizationResponse::Html { html, story_data, .. } => Ok(Self::Legacy {
                html,
                story: story_data,
            }),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Blueprint(blueprint) => Some(blueprint.title()),
            Self::Legacy { story, .. } => story.story_title.as_deref(),
        }
    }

    /// Number of questions, at least one.
    pub fn question_count(&self) -> usize {
        match self {
            Self::Blueprint(blueprint) => blueprint.question_count(),
            Self::Legacy { story, .. } => story.question_flow.len().max(1),
        }
    }

    /// The question at a 0-based index, when the content describes one.
    pub fn question(&self, index: usize) -> Option<QuestionView> {
        match self {
            Self::Blueprint(blueprint) => blueprint.question_flow().get(index).map(|q| QuestionView {
                number: q.question_number,
                prompt: q.prompt.clone(),
                options: q.options.clone(),
            }),
            Self::Legacy { story, .. } => story.question_flow.get(index).map(|q| QuestionView {
                number: q.question_number,
                prompt: q.intuitive_question.clone(),
                options: q
                    .answer_structure
                    .as_ref()
                    .map(|a| a.options.clone())
                    .unwrap_or_default(),
            }),
        }
    }
}
