//! Blueprint rendering.
//!
//! A blueprint document is first resolved into the closed [`GameBlueprint`]
//! sum type, then projected into a [`RenderTree`]. Projection is pure: the
//! blueprint is never mutated and control values a player changes live in a
//! [`RenderedGame`], not here.
//!
//! Unknown variant tags fail with [`BlueprintError::Unsupported`]. There is
//! no fallback renderer.

pub mod instance;
pub mod tree;

pub use instance::{ControlError, ControlValue, RenderedGame};
pub use tree::{Control, RenderTree, VisualizationSurface, Widget};

use serde_json::Value;
use sp_protocol::blueprint_models::{
    BlueprintKind, BlueprintParameter, GameBlueprint, MultipleChoiceStoryBlueprint, ParameterKind,
    ParameterPlaygroundBlueprint, SequenceBuilderBlueprint, VisualizationDescriptor,
    REGISTRY_TEMPLATE_TAGS,
};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlueprintError {
    #[error("Unsupported blueprint variant: {tag}")]
    Unsupported { tag: String },

    #[error("Blueprint document has no templateType")]
    MissingTag,

    #[error("Malformed {kind} blueprint: {reason}")]
    Malformed { kind: BlueprintKind, reason: String },

    #[error("Invalid parameter '{id}': {reason}")]
    InvalidParameter { id: String, reason: String },
}

pub type BlueprintResult<T> = Result<T, BlueprintError>;

/// Resolve a raw blueprint document into a typed [`GameBlueprint`].
///
/// The tag comes from the document's own `templateType`, or from
/// `fallback_tag` (the stored envelope's `template_type`) when the document
/// omits it.
pub fn resolve_blueprint(document: &Value, fallback_tag: Option<&str>) -> BlueprintResult<GameBlueprint> {
    let tag = document
        .get("templateType")
        .and_then(Value::as_str)
        .or(fallback_tag)
        .ok_or(BlueprintError::MissingTag)?;

    let Some(kind) = BlueprintKind::from_tag(tag) else {
        if REGISTRY_TEMPLATE_TAGS.contains(&tag) {
            warn!(%tag, "blueprint variant is known but not playable here");
        }
        return Err(BlueprintError::Unsupported {
            tag: tag.to_string(),
        });
    };

    let mut document = document.clone();
    match &mut document {
        Value::Object(fields) => {
            fields.insert("templateType".to_string(), Value::String(kind.tag().to_string()));
        }
        _ => {
            return Err(BlueprintError::Malformed {
                kind,
                reason: "document is not an object".to_string(),
            })
        }
    }

    serde_json::from_value(document).map_err(|e| BlueprintError::Malformed {
        kind,
        reason: e.to_string(),
    })
}

/// Projection of one blueprint variant.
pub trait BlueprintTemplate {
    fn kind(&self) -> BlueprintKind;

    fn controls(&self) -> BlueprintResult<Vec<Control>>;

    fn title(&self) -> &str;

    fn narrative(&self) -> &str;

    fn visualization(&self) -> &VisualizationDescriptor;

    fn project(&self) -> BlueprintResult<RenderTree> {
        Ok(RenderTree {
            kind: self.kind(),
            title: self.title().to_string(),
            narrative: self.narrative().to_string(),
            controls: self.controls()?,
            visualization: VisualizationSurface {
                asset_url: self.visualization().asset_url.clone(),
                caption: self.visualization().caption.clone(),
            },
        })
    }
}

/// Dispatches a blueprint to the template of its variant.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlueprintRenderer;

impl BlueprintRenderer {
    pub fn render(&self, blueprint: &GameBlueprint) -> BlueprintResult<RenderTree> {
        match blueprint {
            GameBlueprint::ParameterPlayground(b) => b.project(),
            GameBlueprint::MultipleChoiceStory(b) => b.project(),
            GameBlueprint::SequenceBuilder(b) => b.project(),
        }
    }

    /// Resolve and render in one step.
    pub fn render_document(&self, document: &Value, fallback_tag: Option<&str>) -> BlueprintResult<RenderTree> {
        self.render(&resolve_blueprint(document, fallback_tag)?)
    }
}

impl BlueprintTemplate for ParameterPlaygroundBlueprint {
    fn kind(&self) -> BlueprintKind {
        BlueprintKind::ParameterPlayground
    }

    fn controls(&self) -> BlueprintResult<Vec<Control>> {
        self.parameters.iter().map(parameter_control).collect()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn narrative(&self) -> &str {
        &self.narrative_intro
    }

    fn visualization(&self) -> &VisualizationDescriptor {
        &self.visualization
    }
}

impl BlueprintTemplate for MultipleChoiceStoryBlueprint {
    fn kind(&self) -> BlueprintKind {
        BlueprintKind::MultipleChoiceStory
    }

    fn controls(&self) -> BlueprintResult<Vec<Control>> {
        self.question_flow
            .iter()
            .map(|q| {
                if q.options.is_empty() {
                    return Err(BlueprintError::InvalidParameter {
                        id: format!("q{}", q.question_number),
                        reason: "question has no options".to_string(),
                    });
                }
                Ok(Control {
                    id: format!("q{}", q.question_number),
                    label: q.prompt.clone(),
                    widget: Widget::Choice {
                        options: q.options.clone(),
                    },
                })
            })
            .collect()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn narrative(&self) -> &str {
        &self.narrative_intro
    }

    fn visualization(&self) -> &VisualizationDescriptor {
        &self.visualization
    }
}

impl BlueprintTemplate for SequenceBuilderBlueprint {
    fn kind(&self) -> BlueprintKind {
        BlueprintKind::SequenceBuilder
    }

    fn controls(&self) -> BlueprintResult<Vec<Control>> {
        Ok(vec![Control {
            id: "sequence".to_string(),
            label: "Put the items in order".to_string(),
            widget: Widget::Ordering {
                items: self.items.iter().map(|item| item.text.clone()).collect(),
            },
        }])
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn narrative(&self) -> &str {
        &self.narrative_intro
    }

    fn visualization(&self) -> &VisualizationDescriptor {
        &self.visualization
    }
}

fn parameter_control(parameter: &BlueprintParameter) -> BlueprintResult<Control> {
    let invalid = |reason: String| BlueprintError::InvalidParameter {
        id: parameter.id.clone(),
        reason,
    };

    let widget = match &parameter.kind {
        ParameterKind::Slider {
            min,
            max,
            step,
            default_value,
        } => {
            if !(min.is_finite() && max.is_finite()) || min > max {
                return Err(invalid(format!("bounds {min}..{max} are not a valid range")));
            }
            if !(*min..=*max).contains(default_value) {
                return Err(invalid(format!("default {default_value} is outside {min}..{max}")));
            }
            if let Some(step) = step {
                if *step <= 0.0 {
                    return Err(invalid(format!("step {step} must be positive")));
                }
            }
            Widget::Slider {
                min: *min,
                max: *max,
                step: *step,
                value: *default_value,
            }
        }
        ParameterKind::Toggle { default_value } => Widget::Toggle {
            value: *default_value,
        },
        ParameterKind::Select {
            options,
            default_value,
        } => {
            if options.is_empty() {
                return Err(invalid("select has no options".to_string()));
            }
            if let Some(default) = default_value {
                if !options.contains(default) {
                    return Err(invalid(format!("default '{default}' is not one of the options")));
                }
            }
            Widget::Select {
                options: options.clone(),
                selected: default_value.clone(),
            }
        }
    };

    Ok(Control {
        id: parameter.id.clone(),
        label: parameter.label.clone(),
        widget,
    })
}
