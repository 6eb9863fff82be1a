//! Game content and answer-checking models.
//!
//! The visualization endpoint returns either a typed blueprint envelope or a
//! legacy HTML payload with its story data. Answer checking is a separate
//! round-trip keyed by visualization id and question number.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Response body of `GET /api/visualization/{id}`.
///
/// ```json
/// { "id": "v1", "type": "html", "html": "<div>...</div>", "story_data": { "question_flow": [] } }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VisualizationResponse {
    /// A typed game blueprint.
    Blueprint {
        id: String,
        blueprint: BlueprintEnvelope,
        #[serde(default)]
        story_data: StoryData,
    },

    /// Legacy flat markup plus the story it was generated from.
    Html {
        id: String,
        #[serde(default)]
        html: String,
        #[serde(default, alias = "question_data")]
        story_data: StoryData,
    },
}

/// Stored blueprint record wrapping the raw blueprint document.
///
/// The document stays untyped here; the renderer resolves it into a
/// [`crate::GameBlueprint`] and rejects unsupported variants.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct BlueprintEnvelope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub template_type: Option<String>,
    pub blueprint: Value,
    #[serde(default)]
    pub assets: Value,
}

/// Story generated for a question, used by legacy visualizations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct StoryData {
    #[serde(default)]
    pub story_title: Option<String>,
    #[serde(default)]
    pub story_context: Option<String>,
    #[serde(default)]
    pub question_flow: Vec<LegacyQuestion>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct LegacyQuestion {
    pub question_number: u32,
    #[serde(default)]
    pub intuitive_question: String,
    #[serde(default)]
    pub answer_structure: Option<AnswerStructure>,
}

/// Answer options of a legacy question. The correct answer stays server-side.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct AnswerStructure {
    #[serde(default)]
    pub options: Vec<String>,
}

/// Request body of `POST /api/check-answer/{visualization_id}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCheckRequest {
    /// 1-based question number.
    pub question_number: u32,
    pub selected_answer: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
pub struct AnswerCheckResponse {
    pub is_correct: bool,
}

/// One answered question in a game session. Never mutated once recorded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_number: u32,
    pub selected_answer: String,
    pub is_correct: bool,
}
