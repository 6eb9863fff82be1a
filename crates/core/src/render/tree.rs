//! Presentation tree produced by the renderer.

use serde::Serialize;
use sp_protocol::blueprint_models::BlueprintKind;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderTree {
    pub kind: BlueprintKind,
    pub title: String,
    pub narrative: String,
    pub controls: Vec<Control>,
    pub visualization: VisualizationSurface,
}

impl RenderTree {
    pub fn control(&self, id: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Control {
    pub id: String,
    pub label: String,
    pub widget: Widget,
}

/// Interactive widget with its initial value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "lowercase")]
pub enum Widget {
    Slider {
        min: f64,
        max: f64,
        step: Option<f64>,
        value: f64,
    },
    Toggle {
        value: bool,
    },
    Select {
        options: Vec<String>,
        selected: Option<String>,
    },
    /// One answer out of a fixed set.
    Choice {
        options: Vec<String>,
    },
    /// Items the player arranges into an order.
    Ordering {
        items: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VisualizationSurface {
    pub asset_url: Option<String>,
    pub caption: Option<String>,
}

impl fmt::Display for RenderTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.title, self.kind)?;
        if !self.narrative.is_empty() {
            writeln!(f, "{}", self.narrative)?;
        }
        for control in &self.controls {
            writeln!(f, "  {}: {}", control.label, control.widget)?;
        }
        if let Some(url) = &self.visualization.asset_url {
            write!(f, "  visualization: {url}")?;
            if let Some(caption) = &self.visualization.caption {
                write!(f, " ({caption})")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slider { min, max, value, .. } => write!(f, "slider {min}..{max} = {value}"),
            Self::Toggle { value } => write!(f, "toggle {}", if *value { "on" } else { "off" }),
            Self::Select { options, selected } => {
                write!(f, "select [{}]", options.join(", "))?;
                if let Some(selected) = selected {
                    write!(f, " = {selected}")?;
                }
                Ok(())
            }
            Self::Choice { options } => write!(f, "choose one of [{}]", options.join(", ")),
            Self::Ordering { items } => write!(f, "order [{}]", items.join(", ")),
        }
    }
}
