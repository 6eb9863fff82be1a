//! Cosmetic step-by-step progress animation.
//!
//! Polls arrive every couple of seconds and the backend reports coarse
//! progress, so the display would stall between them. The simulator plays a
//! randomized schedule of step durations and pauses and publishes frames to
//! the [`SessionStore`], which merges them under the authoritative view.
//!
//! Durations are sampled once, up front, in abstract time units scaled by
//! `time_unit_ms`. The final step is longer and holds at 99% until the
//! backend reports completion.

use super::merge::CosmeticFrame;
use crate::store::SessionStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sp_protocol::config_models::{SimulatorSettings, UnitRange};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
struct StepWindow {
    start: f64,
    duration: f64,
}

impl StepWindow {
    fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[derive(Debug, Clone)]
pub struct ProgressSimulator {
    windows: Vec<StepWindow>,
    time_unit_ms: f64,
}

impl ProgressSimulator {
    /// Build a schedule from `settings`, seeded when a seed is configured.
    pub fn new(settings: &SimulatorSettings) -> Self {
        match settings.seed {
            Some(seed) => Self::with_rng(settings, &mut StdRng::seed_from_u64(seed)),
            None => Self::with_rng(settings, &mut StdRng::from_entropy()),
        }
    }

    pub fn with_rng<R: Rng + ?Sized>(settings: &SimulatorSettings, rng: &mut R) -> Self {
        let step_count = settings.step_count.max(1);
        let mut windows = Vec::with_capacity(step_count);
        let mut cursor = 0.0;

        for index in 0..step_count {
            if index > 0 {
                cursor += sample(rng, &settings.pause_units);
            }
            let range = if index + 1 == step_count {
                &settings.final_step_units
            } else {
                &settings.step_units
            };
            let duration = sample(rng, range);
            windows.push(StepWindow {
                start: cursor,
                duration,
            });
            cursor += duration;
        }

        Self {
            windows,
            time_unit_ms: settings.time_unit_ms.max(1) as f64,
        }
    }

    pub fn step_count(&self) -> usize {
        self.windows.len()
    }

    /// Time until the animation has played every step.
    pub fn total_duration(&self) -> Duration {
        let units = self.windows.last().map(StepWindow::end).unwrap_or(0.0);
        Duration::from_secs_f64(units * self.time_unit_ms / 1000.0)
    }

    /// The frame to show `elapsed` after the animation started.
    pub fn frame_at(&self, elapsed: Duration) -> CosmeticFrame {
        let units = elapsed.as_secs_f64() * 1000.0 / self.time_unit_ms;
        let count = self.windows.len();

        for (index, window) in self.windows.iter().enumerate() {
            if units < window.start {
                return self.frame(index, 0, false);
            }
            if units < window.end() {
                let percent = ((units - window.start) / window.duration * 100.0).floor();
                return self.frame(index, (percent as u8).min(99), false);
            }
        }

        self.frame(count.saturating_sub(1), 99, true)
    }

    fn frame(&self, step_index: usize, step_percent: u8, finished: bool) -> CosmeticFrame {
        let count = self.windows.len().max(1);
        let overall = (step_index * 100 + usize::from(step_percent)) / count;
        CosmeticFrame {
            step_index,
            step_percent,
            overall: overall.min(99) as u8,
            finished,
        }
    }

    /// Publish frames to `store` every `tick` until the run is terminal,
    /// the animation runs out, or `cancel` fires.
    pub async fn drive(self, store: Arc<SessionStore>, tick: Duration, cancel: CancellationToken) {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("progress animation cancelled");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let frame = self.frame_at(started.elapsed());
            if store.apply_cosmetic(frame).is_none() {
                debug!("run is terminal, stopping progress animation");
                break;
            }
            if frame.finished {
                break;
            }
        }
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, range: &UnitRange) -> f64 {
    if range.max <= range.min {
        range.min
    } else {
        rng.gen_range(range.min..=range.max)
    }
}
