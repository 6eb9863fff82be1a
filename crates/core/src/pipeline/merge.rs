//! Authority-wins merge of real and cosmetic progress.
//!
//! Two producers feed the progress display: polls of the backend (the
//! authority) and the local animation (cosmetic). [`merge_display`] is the
//! only place they meet. The cosmetic frame may fill the gap between polls
//! but never shows a step beyond the one the authority has reached, and it
//! is discarded outright once the authority reports a terminal status.

use crate::store::PipelineView;
use serde::{Deserialize, Serialize};
use sp_protocol::pipeline_models::{RunStatus, StepStatus};

/// One frame of the local progress animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmeticFrame {
    /// 0-based step the animation is in.
    pub step_index: usize,
    pub step_percent: u8,
    pub overall: u8,
    /// The animation has nothing left to play.
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplaySource {
    Authoritative,
    Cosmetic,
}

/// What the progress display shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayProgress {
    pub overall: u8,
    /// 0-based step highlighted as active.
    pub active_step: usize,
    pub step_percent: u8,
    pub source: DisplaySource,
}

impl Default for DisplayProgress {
    fn default() -> Self {
        Self {
            overall: 0,
            active_step: 0,
            step_percent: 0,
            source: DisplaySource::Authoritative,
        }
    }
}

impl DisplayProgress {
    /// Coarse caption shown under the progress bar.
    pub fn caption(&self) -> &'static str {
        match self.overall {
            0..=29 => "Analyzing question...",
            30..=59 => "Generating story...",
            60..=89 => "Creating visualization...",
            _ => "Finalizing...",
        }
    }
}

/// Merge the authoritative view with the latest cosmetic frame.
///
/// `step_count` is the number of steps the display walks through.
pub fn merge_display(
    view: &PipelineView,
    cosmetic: Option<&CosmeticFrame>,
    step_count: usize,
) -> DisplayProgress {
    let step_count = step_count.max(1);

    match view.status {
        RunStatus::Completed => DisplayProgress {
            overall: 100,
            active_step: step_count - 1,
            step_percent: 100,
            source: DisplaySource::Authoritative,
        },
        RunStatus::Error | RunStatus::Failed => authoritative(view, step_count),
        RunStatus::Pending | RunStatus::Processing => {
            let real = authoritative(view, step_count);
            match cosmetic {
                Some(frame) => with_cosmetic(real, frame, step_count),
                None => real,
            }
        }
    }
}

fn authoritative(view: &PipelineView, step_count: usize) -> DisplayProgress {
    let progress = usize::from(view.progress.min(100));
    let by_progress = (progress * step_count / 100).min(step_count - 1);
    let by_steps = view
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Done)
        .count()
        .min(step_count - 1);
    let active_step = by_progress.max(by_steps);

    let within = (progress * step_count).saturating_sub(active_step * 100).min(99);

    DisplayProgress {
        overall: view.progress.min(100),
        active_step,
        step_percent: within as u8,
        source: DisplaySource::Authoritative,
    }
}

fn with_cosmetic(real: DisplayProgress, frame: &CosmeticFrame, step_count: usize) -> DisplayProgress {
    let covered = real.active_step;

    let step_percent = if frame.step_index > covered {
        99
    } else if frame.step_index == covered {
        frame.step_percent.min(99).max(real.step_percent)
    } else {
        real.step_percent
    };

    // Highest overall value that still sits inside the covered step.
    let ceiling = ((covered + 1) * 100 / step_count).saturating_sub(1).min(99) as u8;
    let overall = real.overall.max(frame.overall.min(ceiling));

    let source = if overall > real.overall || step_percent > real.step_percent {
        DisplaySource::Cosmetic
    } else {
        DisplaySource::Authoritative
    };

    DisplayProgress {
        overall,
        active_step: covered,
        step_percent,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_protocol::pipeline_models::StepRecord;

    fn view(status: RunStatus, progress: u8) -> PipelineView {
        PipelineView {
            status,
            progress,
            ..Default::default()
        }
    }

    fn frame(step_index: usize, step_percent: u8, overall: u8) -> CosmeticFrame {
        CosmeticFrame {
            step_index,
            step_percent,
            overall,
            finished: false,
        }
    }

    fn done_step(number: u32) -> StepRecord {
        StepRecord {
            id: format!("s{number}"),
            step_number: number,
            step_name: format!("step_{number}"),
            status: StepStatus::Done,
            error_message: None,
            retry_count: 0,
            started_at: None,
            completed_at: None,
            validation_result: None,
        }
    }

    #[test]
    fn test_completed_collapses_to_full() {
        let merged = merge_display(&view(RunStatus::Completed, 60), Some(&frame(2, 10, 25)), 4);
        assert_eq!(merged.overall, 100);
        assert_eq!(merged.active_step, 3);
        assert_eq!(merged.step_percent, 100);
        assert_eq!(merged.source, DisplaySource::Authoritative);
    }

    #[test]
    fn test_failure_discards_cosmetic() {
        let merged = merge_display(&view(RunStatus::Error, 30), Some(&frame(3, 80, 95)), 4);
        assert_eq!(merged.overall, 30);
        assert_eq!(merged.source, DisplaySource::Authoritative);
    }

    #[test]
    fn test_cosmetic_cannot_pass_covered_step() {
        // 4 steps, progress 30 covers step index 1 (25..49).
        let merged = merge_display(&view(RunStatus::Processing, 30), Some(&frame(3, 50, 85)), 4);
        assert_eq!(merged.active_step, 1);
        assert_eq!(merged.step_percent, 99);
        assert_eq!(merged.overall, 49);
        assert_eq!(merged.source, DisplaySource::Cosmetic);
    }

    #[test]
    fn test_cosmetic_fills_gap_within_step() {
        let merged = merge_display(&view(RunStatus::Processing, 25), Some(&frame(1, 40, 35)), 4);
        assert_eq!(merged.active_step, 1);
        assert_eq!(merged.step_percent, 40);
        assert_eq!(merged.overall, 35);
    }

    #[test]
    fn test_lagging_cosmetic_defers_to_authority() {
        let merged = merge_display(&view(RunStatus::Processing, 75), Some(&frame(0, 90, 22)), 4);
        assert_eq!(merged.active_step, 3);
        assert_eq!(merged.overall, 75);
        assert_eq!(merged.source, DisplaySource::Authoritative);
    }

    #[test]
    fn test_done_steps_advance_covered_step() {
        let mut v = view(RunStatus::Processing, 10);
        v.steps = vec![done_step(1), done_step(2)];
        let merged = merge_display(&v, None, 9);
        assert_eq!(merged.active_step, 2);
        assert_eq!(merged.overall, 10);
    }

    #[test]
    fn test_caption_thresholds() {
        let mut display = DisplayProgress::default();
        assert_eq!(display.caption(), "Analyzing question...");
        display.overall = 30;
        assert_eq!(display.caption(), "Generating story...");
        display.overall = 89;
        assert_eq!(display.caption(), "Creating visualization...");
        display.overall = 90;
        assert_eq!(display.caption(), "Finalizing...");
    }
}
