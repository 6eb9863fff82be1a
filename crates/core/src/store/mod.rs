//! Session store shared by the pipeline and game flows.
//!
//! The store is the only shared mutable state of a client session. It keeps
//! the latest [`PipelineView`] behind a `tokio::sync::watch` channel so every
//! update replaces the whole snapshot at once and observers always see a
//! consistent view. It also owns the session [`Scratchpad`] and the root
//! cancellation token every background task of the session derives from.

pub mod scratch;

pub use scratch::{FinalResult, ScratchKey, Scratchpad};

use crate::pipeline::merge::{merge_display, CosmeticFrame, DisplayProgress};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use parking_lot::Mutex;
use serde::Serialize;
use sp_protocol::config_models::ClientConfig;
use sp_protocol::pipeline_models::{
    group_steps_by_layer, PipelineLayer, ProgressSnapshot, RunId, RunStatus, StepRecord,
};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// Client-side view of one pipeline run.
///
/// `status`, `steps`, `current_step` and `error_message` mirror the last
/// accepted poll. `progress` never decreases while a run is active, and
/// `visualization_id` is set at most once, together with `Completed`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PipelineView {
    pub run_id: Option<RunId>,
    pub status: RunStatus,
    pub progress: u8,
    pub current_step: Option<String>,
    pub steps: Vec<StepRecord>,
    pub visualization_id: Option<String>,
    pub error_message: Option<String>,
    pub last_polled_at: Option<DateTime<Utc>>,
    pub display: DisplayProgress,
}

impl PipelineView {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn layers(&self) -> Vec<(PipelineLayer, Vec<&StepRecord>)> {
        group_steps_by_layer(&self.steps)
    }
}

pub struct SessionStore {
    session_id: Uuid,
    step_count: usize,
    view: watch::Sender<PipelineView>,
    cosmetic: Mutex<Option<CosmeticFrame>>,
    scratch: Scratchpad,
    root: Mutex<CancellationToken>,
}

impl SessionStore {
    /// Create a store whose progress display walks through `step_count` steps.
    pub fn new(step_count: usize) -> Self {
        let (view, _) = watch::channel(PipelineView::default());
        Self {
            session_id: Uuid::new_v4(),
            step_count: step_count.max(1),
            view,
            cosmetic: Mutex::new(None),
            scratch: Scratchpad::new(),
            root: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.simulator.step_count)
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn scratch(&self) -> &Scratchpad {
        &self.scratch
    }

    /// Current view, cloned out of the channel.
    pub fn snapshot(&self) -> PipelineView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineView> {
        self.view.subscribe()
    }

    /// Stream of views, starting with the current one.
    pub fn updates(&self) -> WatchStream<PipelineView> {
        WatchStream::new(self.view.subscribe())
    }

    /// A token cancelled when the session is torn down or reset.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.root.lock().child_token()
    }

    /// Make `run_id` the active run, dropping whatever was tracked before.
    pub fn begin_run(&self, run_id: &RunId) {
        *self.cosmetic.lock() = None;
        self.scratch.set(ScratchKey::RunId, run_id.as_str());
        self.scratch.remove(ScratchKey::VisualizationId);
        self.view.send_replace(PipelineView {
            run_id: Some(run_id.clone()),
            ..Default::default()
        });
        debug!(%run_id, "tracking pipeline run");
    }

    /// Fold one poll result into the view and return the updated view.
    ///
    /// Returns `None` when the snapshot is refused: it belongs to another
    /// run, or the view is already terminal.
    pub fn apply_snapshot(&self, snapshot: &ProgressSnapshot) -> Option<PipelineView> {
        let step_count = self.step_count;
        let accepted = self.view.send_if_modified(|view| {
            if view.is_terminal() {
                debug!(status = ?view.status, "ignoring snapshot for finished run");
                return false;
            }
            if let (Some(active), Some(incoming)) = (&view.run_id, &snapshot.run_id) {
                if active != incoming {
                    debug!(%active, %incoming, "ignoring snapshot for another run");
                    return false;
                }
            }

            let visualization_id = snapshot
                .visualization_id
                .as_deref()
                .filter(|id| !id.trim().is_empty());

            view.status = match (snapshot.status, visualization_id) {
                (RunStatus::Completed, None) => {
                    warn!("run reported completed without a visualization id");
                    RunStatus::Processing
                }
                (status, _) => status,
            };
            if view.status == RunStatus::Completed {
                match (&view.visualization_id, visualization_id) {
                    (None, Some(id)) => view.visualization_id = Some(id.to_string()),
                    (Some(existing), Some(id)) if existing != id => {
                        warn!(%existing, new = %id, "visualization id already assigned");
                    }
                    _ => {}
                }
                view.progress = 100;
            } else if let Some(progress) = snapshot.progress_value() {
                view.progress = view.progress.max(progress);
            }

            view.current_step = snapshot.current_step.clone();
            view.steps = snapshot.steps.clone();
            view.error_message = if view.status.is_failure() {
                snapshot.error_message.clone()
            } else {
                None
            };
            view.last_polled_at = Some(Utc::now());

            let cosmetic = *self.cosmetic.lock();
            refresh_display(view, cosmetic.as_ref(), step_count);
            true
        });
        accepted.then(|| self.snapshot())
    }

    /// Record a new animation frame. Returns `None` once the run is terminal,
    /// in which case the frame is discarded.
    pub fn apply_cosmetic(&self, frame: CosmeticFrame) -> Option<DisplayProgress> {
        if self.view.borrow().is_terminal() {
            return None;
        }
        *self.cosmetic.lock() = Some(frame);

        let step_count = self.step_count;
        let mut display = None;
        self.view.send_if_modified(|view| {
            if view.is_terminal() {
                return false;
            }
            let before = view.display;
            refresh_display(view, Some(&frame), step_count);
            display = Some(view.display);
            view.display != before
        });
        display
    }

    /// Mark the active run failed for a reason the backend never reported,
    /// such as running out of poll attempts.
    pub fn fail_run(&self, message: &str) {
        let step_count = self.step_count;
        self.view.send_if_modified(|view| {
            if view.is_terminal() {
                return false;
            }
            view.status = RunStatus::Failed;
            view.error_message = Some(message.to_string());
            refresh_display(view, None, step_count);
            true
        });
    }

    /// Cancel every task derived from this session.
    pub fn teardown(&self) {
        self.root.lock().cancel();
    }

    /// Tear down and start over with an empty view and scratchpad.
    pub fn reset(&self) {
        {
            let mut root = self.root.lock();
            root.cancel();
            *root = CancellationToken::new();
        }
        *self.cosmetic.lock() = None;
        self.scratch.clear();
        self.view.send_replace(PipelineView::default());
        debug!(session_id = %self.session_id, "session reset");
    }
}

/// Recompute the display, never moving `overall` or the highlighted step
/// backwards. Step lists are replaced on every poll, so a retried step can
/// drop the authoritative step cursor even though the run moved on.
fn refresh_display(view: &mut PipelineView, cosmetic: Option<&CosmeticFrame>, step_count: usize) {
    let previous = view.display;
    let mut merged = merge_display(view, cosmetic, step_count);
    merged.overall = merged.overall.max(previous.overall);
    match merged.active_step.cmp(&previous.active_step) {
        Ordering::Less => {
            merged.active_step = previous.active_step;
            merged.step_percent = previous.step_percent;
        }
        Ordering::Equal => merged.step_percent = merged.step_percent.max(previous.step_percent),
        Ordering::Greater => {}
    }
    view.display = merged;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sp_protocol::pipeline_models::StepStatus;

    fn snapshot(status: RunStatus, progress: serde_json::Value) -> ProgressSnapshot {
        ProgressSnapshot {
            status,
            progress: Some(progress),
            ..Default::default()
        }
    }

    #[test]
    fn test_progress_never_decreases() {
        let store = SessionStore::new(9);
        store.begin_run(&RunId::new("r1"));

        for (progress, expected) in [(json!(40), 40), (json!(25), 40), (json!(null), 40), (json!("55"), 55)] {
            let view = store
                .apply_snapshot(&snapshot(RunStatus::Processing, progress))
                .expect("snapshot accepted");
            assert_eq!(view.progress, expected);
        }
    }

    #[test]
    fn test_completion_requires_visualization_id() {
        let store = SessionStore::new(9);
        store.begin_run(&RunId::new("r1"));

        let view = store
            .apply_snapshot(&snapshot(RunStatus::Completed, json!(100)))
            .expect("snapshot accepted");
        assert_eq!(view.status, RunStatus::Processing);
        assert!(view.visualization_id.is_none());

        let mut done = snapshot(RunStatus::Completed, json!(100));
        done.visualization_id = Some("v1".to_string());
        let view = store.apply_snapshot(&done).expect("snapshot accepted");
        assert_eq!(view.status, RunStatus::Completed);
        assert_eq!(view.visualization_id.as_deref(), Some("v1"));
        assert_eq!(view.display.overall, 100);

        // Terminal views absorb later snapshots.
        done.visualization_id = Some("v2".to_string());
        assert!(store.apply_snapshot(&done).is_none());
        assert_eq!(store.snapshot().visualization_id.as_deref(), Some("v1"));
    }

    #[test]
    fn test_error_message_only_on_failure() {
        let store = SessionStore::new(9);
        store.begin_run(&RunId::new("r1"));

        let mut running = snapshot(RunStatus::Processing, json!(10));
        running.error_message = Some("stale".to_string());
        let view = store.apply_snapshot(&running).expect("snapshot accepted");
        assert!(view.error_message.is_none());

        let mut failed = snapshot(RunStatus::Error, json!(10));
        failed.error_message = Some("timeout".to_string());
        let view = store.apply_snapshot(&failed).expect("snapshot accepted");
        assert_eq!(view.status, RunStatus::Error);
        assert_eq!(view.error_message.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_snapshot_for_other_run_ignored() {
        let store = SessionStore::new(9);
        store.begin_run(&RunId::new("r1"));

        let mut other = snapshot(RunStatus::Processing, json!(80));
        other.run_id = Some(RunId::new("r0"));
        assert!(store.apply_snapshot(&other).is_none());

        let mut foreign_done = snapshot(RunStatus::Completed, json!(100));
        foreign_done.run_id = Some(RunId::new("r0"));
        foreign_done.visualization_id = Some("vX".to_string());
        assert!(store.apply_snapshot(&foreign_done).is_none());

        let view = store.snapshot();
        assert_eq!(view.status, RunStatus::Pending);
        assert_eq!(view.progress, 0);
        assert!(view.visualization_id.is_none());
    }

    #[test]
    fn test_cosmetic_discarded_after_terminal() {
        let store = SessionStore::new(4);
        store.begin_run(&RunId::new("r1"));
        store.apply_snapshot(&snapshot(RunStatus::Processing, json!(25)));

        let frame = CosmeticFrame {
            step_index: 1,
            step_percent: 50,
            overall: 37,
            finished: false,
        };
        let display = store.apply_cosmetic(frame).expect("frame applied");
        assert_eq!(display.overall, 37);

        store.fail_run("Processing is taking too long. Please try again.");
        assert!(store.apply_cosmetic(frame).is_none());
        let view = store.snapshot();
        assert_eq!(view.status, RunStatus::Failed);
        assert_eq!(view.progress, 25);
        // The bar holds where it stood; it never runs backwards on failure.
        assert_eq!(view.display.overall, 37);
    }

    #[test]
    fn test_active_step_holds_when_step_is_retried() {
        let store = SessionStore::new(4);
        store.begin_run(&RunId::new("r1"));

        let done = |n: u32| StepRecord {
            id: format!("s{n}"),
            step_number: n,
            step_name: format!("step {n}"),
            status: StepStatus::Done,
            error_message: None,
            retry_count: 0,
            started_at: None,
            completed_at: None,
            validation_result: None,
        };

        let mut first = snapshot(RunStatus::Processing, json!(30));
        first.steps = vec![done(1), done(2)];
        let view = store.apply_snapshot(&first).expect("snapshot accepted");
        assert_eq!(view.display.active_step, 2);

        let mut retried = snapshot(RunStatus::Processing, json!(30));
        retried.steps = vec![done(1), StepRecord { status: StepStatus::Running, retry_count: 1, ..done(2) }];
        let view = store.apply_snapshot(&retried).expect("snapshot accepted");
        assert_eq!(view.steps[1].status, StepStatus::Running);
        assert_eq!(view.display.active_step, 2);
        assert_eq!(view.display.overall, 30);
    }

    #[test]
    fn test_reset_cancels_and_clears() {
        let store = SessionStore::new(9);
        let token = store.cancellation_token();
        store.begin_run(&RunId::new("r1"));
        store.scratch().set(ScratchKey::VisualizationId, "v1");

        store.reset();

        assert!(token.is_cancelled());
        assert!(!store.cancellation_token().is_cancelled());
        assert_eq!(store.snapshot(), PipelineView::default());
        assert_eq!(store.scratch().get(ScratchKey::RunId), None);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let store = SessionStore::new(9);
        let mut rx = store.subscribe();
        store.begin_run(&RunId::new("r1"));
        store.apply_snapshot(&snapshot(RunStatus::Processing, json!(12)));

        rx.changed().await.expect("sender alive");
        assert_eq!(rx.borrow_and_update().progress, 12);
    }
}
