//! Pipeline run models as reported by the backend progress endpoint.
//!
//! This module defines the structures for tracking one backend
//! transformation run: its status, its ordered steps and the snapshot
//! returned by every poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use ts_rs::TS;

/// Opaque identifier of one backend pipeline run.
///
/// The backend calls this a `process_id`. The client never inspects it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, TS)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier carries no usable token.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Lifecycle status of a pipeline run.
///
/// The status progresses through these states during normal execution:
/// Pending -> Processing -> Completed
///
/// `Completed`, `Error` and `Failed` are terminal and absorbing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Run has been accepted but no step has started yet.
    #[default]
    Pending,

    /// Run is actively executing steps.
    Processing,

    /// Run finished and produced a visualization.
    Completed,

    /// Run stopped because a step raised an error.
    Error,

    /// Run was marked failed by the backend.
    Failed,
}

impl RunStatus {
    /// Whether no further transition can occur from this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Failed)
    }

    /// Whether the backend reported the run as broken.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Error | Self::Failed)
    }
}

/// Status of a single pipeline step.
///
/// The backend uses a few different spellings over time; the aliases
/// accept all of them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    #[serde(alias = "processing", alias = "in_progress")]
    Running,
    #[serde(alias = "completed", alias = "success")]
    Done,
    #[serde(alias = "error")]
    Failed,
}

/// One named stage of the pipeline as reported by the backend.
///
/// Steps arrive in execution order; `step_number` is stable across polls.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct StepRecord {
    /// Backend identifier, used when asking for a retry.
    pub id: String,

    /// 1-based ordinal of the step in the pipeline.
    pub step_number: u32,

    pub step_name: String,

    #[serde(default)]
    pub status: StepStatus,

    #[serde(default)]
    pub error_message: Option<String>,

    #[serde(default)]
    pub retry_count: u32,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    /// Free-form validator output attached to the step, if any.
    #[serde(default)]
    pub validation_result: Option<Value>,
}

/// Display grouping of steps into the four logical pipeline layers.
///
/// Grouping is derived from the step ordinal only and carries no authority.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum PipelineLayer {
    InputProcessing,
    IntentClassification,
    StrategyEngine,
    ContentGeneration,
}

impl PipelineLayer {
    pub fn from_step_number(step_number: u32) -> Self {
        match step_number {
            0..=2 => Self::InputProcessing,
            3 => Self::IntentClassification,
            4 => Self::StrategyEngine,
            _ => Self::ContentGeneration,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::InputProcessing => "Layer 1: Input & Document Processing",
            Self::IntentClassification => "Layer 2: Intent Recognition & Classification",
            Self::StrategyEngine => "Layer 3: Gamification Strategy Engine",
            Self::ContentGeneration => "Layer 4: Multi-Modal Content Generation",
        }
    }
}

impl fmt::Display for PipelineLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Group steps by layer, layers in pipeline order and steps in insertion order.
pub fn group_steps_by_layer(steps: &[StepRecord]) -> Vec<(PipelineLayer, Vec<&StepRecord>)> {
    let mut groups: Vec<(PipelineLayer, Vec<&StepRecord>)> = Vec::new();
    for step in steps {
        let layer = PipelineLayer::from_step_number(step.step_number);
        match groups.iter_mut().find(|(l, _)| *l == layer) {
            Some((_, members)) => members.push(step),
            None => groups.push((layer, vec![step])),
        }
    }
    groups.sort_by_key(|(layer, _)| *layer);
    groups
}

/// Response body of `GET /api/progress/{run_id}`.
///
/// `progress` is kept as raw JSON: the backend has been seen sending
/// numbers, numeric strings and `null`. Use [`ProgressSnapshot::progress_value`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
pub struct ProgressSnapshot {
    #[serde(default, alias = "process_id")]
    pub run_id: Option<RunId>,

    #[serde(default)]
    pub status: RunStatus,

    #[serde(default)]
    pub progress: Option<Value>,

    #[serde(default)]
    pub current_step: Option<String>,

    #[serde(default)]
    pub steps: Vec<StepRecord>,

    /// Present only once the run is completed.
    #[serde(default)]
    pub visualization_id: Option<String>,

    /// Present only when the run errored or failed.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ProgressSnapshot {
    /// Numeric progress clamped into 0-100, or `None` when absent or malformed.
    pub fn progress_value(&self) -> Option<u8> {
        let raw = match self.progress.as_ref()? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if !raw.is_finite() {
            return None;
        }
        Some(raw.round().clamp(0.0, 100.0) as u8)
    }
}

/// Response body of `POST /api/process/{content_id}`.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
pub struct StartRunResponse {
    #[serde(alias = "process_id")]
    pub run_id: RunId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(number: u32, name: &str) -> StepRecord {
        StepRecord {
            id: format!("step-{number}"),
            step_number: number,
            step_name: name.to_string(),
            status: StepStatus::Pending,
            error_message: None,
            retry_count: 0,
            started_at: None,
            completed_at: None,
            validation_result: None,
        }
    }

    #[test]
    fn test_progress_value_accepts_numbers_and_numeric_strings() {
        let mut snapshot = ProgressSnapshot {
            progress: Some(json!(42)),
            ..Default::default()
        };
        assert_eq!(snapshot.progress_value(), Some(42));

        snapshot.progress = Some(json!("57"));
        assert_eq!(snapshot.progress_value(), Some(57));

        snapshot.progress = Some(json!(33.6));
        assert_eq!(snapshot.progress_value(), Some(34));

        snapshot.progress = Some(json!(140));
        assert_eq!(snapshot.progress_value(), Some(100));
    }

    #[test]
    fn test_progress_value_rejects_malformed() {
        let mut snapshot = ProgressSnapshot::default();
        assert_eq!(snapshot.progress_value(), None);

        snapshot.progress = Some(Value::Null);
        assert_eq!(snapshot.progress_value(), None);

        snapshot.progress = Some(json!("almost done"));
        assert_eq!(snapshot.progress_value(), None);

        snapshot.progress = Some(json!({"value": 10}));
        assert_eq!(snapshot.progress_value(), None);
    }

    #[test]
    fn test_run_status_terminal() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Processing.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Error.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Completed.is_failure());
    }

    #[test]
    fn test_layer_from_step_number() {
        assert_eq!(PipelineLayer::from_step_number(1), PipelineLayer::InputProcessing);
        assert_eq!(PipelineLayer::from_step_number(2), PipelineLayer::InputProcessing);
        assert_eq!(PipelineLayer::from_step_number(3), PipelineLayer::IntentClassification);
        assert_eq!(PipelineLayer::from_step_number(4), PipelineLayer::StrategyEngine);
        assert_eq!(PipelineLayer::from_step_number(9), PipelineLayer::ContentGeneration);
    }

    #[test]
    fn test_group_steps_by_layer_keeps_order() {
        let steps = vec![
            step(5, "strategy_creation"),
            step(1, "document_parsing"),
            step(6, "story_generation"),
            step(2, "question_extraction"),
        ];

        let groups = group_steps_by_layer(&steps);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, PipelineLayer::InputProcessing);
        assert_eq!(groups[0].1[0].step_name, "document_parsing");
        assert_eq!(groups[0].1[1].step_name, "question_extraction");
        assert_eq!(groups[1].0, PipelineLayer::ContentGeneration);
        assert_eq!(groups[1].1.len(), 2);
    }

    #[test]
    fn test_run_id_blank() {
        assert!(RunId::new("  ").is_blank());
        assert!(!RunId::new("abc").is_blank());
        assert_eq!(RunId::from("abc").to_string(), "abc");
    }
}
