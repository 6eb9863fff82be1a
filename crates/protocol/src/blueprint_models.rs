//! Game blueprint models.
//!
//! A blueprint is a typed document describing one interactive game. The
//! `templateType` discriminant selects the variant, and each variant carries
//! its own required fields. The set of variants is closed: adding a game
//! type means adding a variant here and handling it everywhere it is matched.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Template tags the backend registry knows about.
///
/// Only the tags with a [`BlueprintKind`] can be played by this client.
pub const REGISTRY_TEMPLATE_TAGS: [&str; 19] = [
    "LABEL_DIAGRAM",
    "IMAGE_HOTSPOT_QA",
    "SEQUENCE_BUILDER",
    "TIMELINE_ORDER",
    "BUCKET_SORT",
    "MATCH_PAIRS",
    "MATRIX_MATCH",
    "PARAMETER_PLAYGROUND",
    "GRAPH_SKETCHER",
    "VECTOR_SANDBOX",
    "STATE_TRACER_CODE",
    "SPOT_THE_MISTAKE",
    "CONCEPT_MAP_BUILDER",
    "MICRO_SCENARIO_BRANCHING",
    "DESIGN_CONSTRAINT_BUILDER",
    "PROBABILITY_LAB",
    "BEFORE_AFTER_TRANSFORMER",
    "GEOMETRY_BUILDER",
    "MULTIPLE_CHOICE_STORY",
];

/// A game blueprint, tagged by `templateType`.
///
/// ```json
/// {
///   "templateType": "PARAMETER_PLAYGROUND",
///   "title": "Projectile motion",
///   "narrativeIntro": "Launch the ball over the wall.",
///   "parameters": [
///     { "id": "angle", "label": "Angle", "type": "slider", "min": 0, "max": 90, "defaultValue": 45 }
///   ],
///   "visualization": { "assetUrl": "https://cdn.example/arc.png" }
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "templateType")]
pub enum GameBlueprint {
    #[serde(rename = "PARAMETER_PLAYGROUND")]
    ParameterPlayground(ParameterPlaygroundBlueprint),

    #[serde(rename = "MULTIPLE_CHOICE_STORY")]
    MultipleChoiceStory(MultipleChoiceStoryBlueprint),

    #[serde(rename = "SEQUENCE_BUILDER")]
    SequenceBuilder(SequenceBuilderBlueprint),
}

impl GameBlueprint {
    pub fn kind(&self) -> BlueprintKind {
        match self {
            Self::ParameterPlayground(_) => BlueprintKind::ParameterPlayground,
            Self::MultipleChoiceStory(_) => BlueprintKind::MultipleChoiceStory,
            Self::SequenceBuilder(_) => BlueprintKind::SequenceBuilder,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::ParameterPlayground(b) => &b.title,
            Self::MultipleChoiceStory(b) => &b.title,
            Self::SequenceBuilder(b) => &b.title,
        }
    }

    pub fn question_flow(&self) -> &[QuestionPrompt] {
        match self {
            Self::ParameterPlayground(b) => &b.question_flow,
            Self::MultipleChoiceStory(b) => &b.question_flow,
            Self::SequenceBuilder(b) => &b.question_flow,
        }
    }

    /// Number of questions a session over this blueprint will ask.
    ///
    /// A blueprint without a question flow still counts as one question.
    pub fn question_count(&self) -> usize {
        self.question_flow().len().max(1)
    }
}

/// Discriminant of the supported blueprint variants.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlueprintKind {
    ParameterPlayground,
    MultipleChoiceStory,
    SequenceBuilder,
}

impl BlueprintKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::ParameterPlayground => "PARAMETER_PLAYGROUND",
            Self::MultipleChoiceStory => "MULTIPLE_CHOICE_STORY",
            Self::SequenceBuilder => "SEQUENCE_BUILDER",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "PARAMETER_PLAYGROUND" => Some(Self::ParameterPlayground),
            "MULTIPLE_CHOICE_STORY" => Some(Self::MultipleChoiceStory),
            "SEQUENCE_BUILDER" => Some(Self::SequenceBuilder),
            _ => None,
        }
    }
}

impl fmt::Display for BlueprintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Explore a model by adjusting its parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct ParameterPlaygroundBlueprint {
    pub title: String,
    pub narrative_intro: String,
    pub parameters: Vec<BlueprintParameter>,
    pub visualization: VisualizationDescriptor,
    #[serde(default)]
    pub question_flow: Vec<QuestionPrompt>,
}

/// A story told through a flow of multiple-choice questions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceStoryBlueprint {
    pub title: String,
    pub narrative_intro: String,
    pub question_flow: Vec<QuestionPrompt>,
    #[serde(default)]
    pub visualization: VisualizationDescriptor,
}

/// Put a set of items into the right order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct SequenceBuilderBlueprint {
    pub title: String,
    pub narrative_intro: String,
    pub items: Vec<SequenceItem>,
    #[serde(default)]
    pub visualization: VisualizationDescriptor,
    #[serde(default)]
    pub question_flow: Vec<QuestionPrompt>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct SequenceItem {
    pub id: String,
    pub text: String,
}

/// One interactive parameter declared by a blueprint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct BlueprintParameter {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: ParameterKind,
}

/// Control kind of a parameter, tagged by `type`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParameterKind {
    Slider {
        min: f64,
        max: f64,
        #[serde(default)]
        step: Option<f64>,
        #[serde(rename = "defaultValue")]
        default_value: f64,
    },
    Toggle {
        #[serde(default, rename = "defaultValue")]
        default_value: bool,
    },
    Select {
        options: Vec<String>,
        #[serde(default, rename = "defaultValue")]
        default_value: Option<String>,
    },
}

/// Where the visualization surface of a game gets its content.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationDescriptor {
    #[serde(default)]
    pub asset_url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

/// A question asked during a blueprint game.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPrompt {
    pub question_number: u32,
    #[serde(alias = "question")]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tag_round_trip() {
        for kind in [
            BlueprintKind::ParameterPlayground,
            BlueprintKind::MultipleChoiceStory,
            BlueprintKind::SequenceBuilder,
        ] {
            assert_eq!(BlueprintKind::from_tag(kind.tag()), Some(kind));
            assert!(REGISTRY_TEMPLATE_TAGS.contains(&kind.tag()));
        }
        assert_eq!(BlueprintKind::from_tag("GRAPH_SKETCHER"), None);
    }

    #[test]
    fn test_question_count_defaults_to_one() {
        let blueprint = GameBlueprint::SequenceBuilder(SequenceBuilderBlueprint {
            title: "Order the phases".to_string(),
            narrative_intro: "Mitosis".to_string(),
            items: vec![],
            visualization: VisualizationDescriptor::default(),
            question_flow: vec![],
        });
        assert_eq!(blueprint.question_count(), 1);
        assert_eq!(blueprint.kind(), BlueprintKind::SequenceBuilder);
        assert_eq!(blueprint.title(), "Order the phases");
    }
}
