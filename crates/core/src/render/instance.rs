//! Local control state of one rendered game.

use super::tree::{RenderTree, Widget};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("No control with id '{0}'")]
    UnknownControl(String),

    #[error("Control '{id}' is a {actual}, not a {expected}")]
    WrongKind {
        id: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("'{value}' is not an option of control '{id}'")]
    UnknownOption { id: String, value: String },

    #[error("Order for '{0}' must contain every item exactly once")]
    InvalidOrder(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Number(f64),
    Flag(bool),
    Choice(Option<String>),
    Order(Vec<String>),
}

/// A rendered blueprint plus the values the player has set.
#[derive(Debug, Clone)]
pub struct RenderedGame {
    tree: RenderTree,
    values: HashMap<String, ControlValue>,
}

impl RenderedGame {
    pub fn new(tree: RenderTree) -> Self {
        let values = tree
            .controls
            .iter()
            .map(|control| {
                let value = match &control.widget {
                    Widget::Slider { value, .. } => ControlValue::Number(*value),
                    Widget::Toggle { value } => ControlValue::Flag(*value),
                    Widget::Select { selected, .. } => ControlValue::Choice(selected.clone()),
                    Widget::Choice { .. } => ControlValue::Choice(None),
                    Widget::Ordering { items } => ControlValue::Order(items.clone()),
                };
                (control.id.clone(), value)
            })
            .collect();
        Self { tree, values }
    }

    pub fn tree(&self) -> &RenderTree {
        &self.tree
    }

    pub fn value(&self, id: &str) -> Option<&ControlValue> {
        self.values.get(id)
    }

    /// Set a slider, clamped into its bounds. Returns the stored value.
    pub fn set_number(&mut self, id: &str, value: f64) -> Result<f64, ControlError> {
        let (min, max) = match self.widget(id)? {
            Widget::Slider { min, max, .. } => (*min, *max),
            other => return Err(wrong_kind(id, "slider", other)),
        };
        let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
        self.values.insert(id.to_string(), ControlValue::Number(clamped));
        Ok(clamped)
    }

    /// Flip a toggle. Returns the new state.
    pub fn toggle(&mut self, id: &str) -> Result<bool, ControlError> {
        match self.widget(id)? {
            Widget::Toggle { .. } => {}
            other => return Err(wrong_kind(id, "toggle", other)),
        }
        let next = !matches!(self.values.get(id), Some(ControlValue::Flag(true)));
        self.values.insert(id.to_string(), ControlValue::Flag(next));
        Ok(next)
    }

    /// Pick an option of a select or choice control.
    pub fn choose(&mut self, id: &str, option: &str) -> Result<(), ControlError> {
        let options = match self.widget(id)? {
            Widget::Select { options, .. } | Widget::Choice { options } => options,
            other => return Err(wrong_kind(id, "select", other)),
        };
        if !options.iter().any(|o| o == option) {
            return Err(ControlError::UnknownOption {
                id: id.to_string(),
                value: option.to_string(),
            });
        }
        self.values
            .insert(id.to_string(), ControlValue::Choice(Some(option.to_string())));
        Ok(())
    }

    /// Replace the order of an ordering control. `order` must be a
    /// permutation of the control's items.
    pub fn reorder(&mut self, id: &str, order: Vec<String>) -> Result<(), ControlError> {
        let items = match self.widget(id)? {
            Widget::Ordering { items } => items,
            other => return Err(wrong_kind(id, "ordering", other)),
        };
        let mut expected = items.clone();
        let mut given = order.clone();
        expected.sort();
        given.sort();
        if expected != given {
            return Err(ControlError::InvalidOrder(id.to_string()));
        }
        self.values.insert(id.to_string(), ControlValue::Order(order));
        Ok(())
    }

    fn widget(&self, id: &str) -> Result<&Widget, ControlError> {
        self.tree
            .control(id)
            .map(|c| &c.widget)
            .ok_or_else(|| ControlError::UnknownControl(id.to_string()))
    }
}

fn wrong_kind(id: &str, expected: &'static str, actual: &Widget) -> ControlError {
    ControlError::WrongKind {
        id: id.to_string(),
        expected,
        actual: widget_name(actual),
    }
}

fn widget_name(widget: &Widget) -> &'static str {
    match widget {
        Widget::Slider { .. } => "slider",
        Widget::Toggle { .. } => "toggle",
        Widget::Select { .. } => "select",
        Widget::Choice { .. } => "choice",
        Widget::Ordering { .. } => "ordering",
    }
}
