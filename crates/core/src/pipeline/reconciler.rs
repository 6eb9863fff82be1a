//! Pipeline reconciler.
//!
//! The reconciler drives one run from start to a terminal outcome. It polls
//! the [`ProgressSource`], folds every snapshot into the [`SessionStore`],
//! and reports progress over the event channel. At most one poll is in
//! flight at a time: the next poll is scheduled one interval after the
//! previous round trip finished.

use super::simulator::ProgressSimulator;
use super::tracker::{PollDecision, RunTracker};
use crate::client::{ProgressSource, SourceError};
use crate::store::{ScratchKey, SessionStore};
use sp_protocol::config_models::{PollSettings, SimulatorSettings};
use sp_protocol::ipc::Event;
use sp_protocol::pipeline_models::{ProgressSnapshot, RunId};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Run identifier must not be empty")]
    InvalidRun,

    #[error("Backend request failed: {0}")]
    Source(#[from] SourceError),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// How a tracked run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { visualization_id: String },
    Failed { message: String },
    /// The session was torn down before the run finished.
    Cancelled,
}

pub struct PipelineReconciler {
    source: Arc<dyn ProgressSource>,
    store: Arc<SessionStore>,
    settings: PollSettings,
    events_tx: Sender<Event>,
    cancel: CancellationToken,
}

impl PipelineReconciler {
    /// Create a reconciler bound to the session in `store`.
    ///
    /// # Arguments
    ///
    /// * `source` - Backend the run is polled from
    /// * `store` - Session store receiving every accepted snapshot
    /// * `settings` - Poll interval, attempt limit and server-fault threshold
    /// * `events_tx` - Channel for sending events to presentation
    pub fn new(
        source: Arc<dyn ProgressSource>,
        store: Arc<SessionStore>,
        settings: PollSettings,
        events_tx: Sender<Event>,
    ) -> Self {
        let cancel = store.cancellation_token();
        Self {
            source,
            store,
            settings,
            events_tx,
            cancel,
        }
    }

    /// Token that stops this reconciler. Cancelled on session teardown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ask the backend to start a run for an uploaded content item.
    pub async fn start_run(&self, content_id: &str) -> ReconcileResult<RunId> {
        let run_id = self.source.start_run(content_id).await?;
        if run_id.is_blank() {
            return Err(ReconcileError::InvalidRun);
        }
        self.store.scratch().set(ScratchKey::ContentId, content_id);
        info!(%content_id, %run_id, "pipeline run started");
        Ok(run_id)
    }

    /// Re-run one pipeline step. The effect shows up on a later poll.
    pub async fn retry_step(&self, step_id: &str) -> ReconcileResult<()> {
        self.source.retry_step(step_id).await?;
        info!(%step_id, "step retry requested");
        Ok(())
    }

    /// Poll `run_id` until it completes, fails, or the session is cancelled.
    ///
    /// The first poll goes out immediately. `RunCompleted` or `RunFailed` is
    /// sent exactly once when the run reaches a terminal outcome, and a
    /// completed run leaves its visualization id in the scratchpad.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidRun`] for a blank run id. Backend
    /// failures while polling never surface here; they are classified and
    /// either retried or turned into [`RunOutcome::Failed`].
    #[instrument(skip(self), fields(run_id = %run_id))]
    pub async fn start(&self, run_id: RunId) -> ReconcileResult<RunOutcome> {
        self.begin(&run_id).await?;
        Ok(self.track(run_id).await)
    }

    async fn begin(&self, run_id: &RunId) -> ReconcileResult<()> {
        if run_id.is_blank() {
            return Err(ReconcileError::InvalidRun);
        }

        self.store.begin_run(run_id);
        let _ = self
            .events_tx
            .send(Event::RunStarted {
                run_id: run_id.clone(),
            })
            .await;
        Ok(())
    }

    async fn track(&self, run_id: RunId) -> RunOutcome {
        let mut tracker = RunTracker::new(self.settings);

        loop {
            if self.cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }

            let result = tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("abandoning in-flight poll after cancellation");
                    return RunOutcome::Cancelled;
                }
                result = self.poll_once(&run_id) => result,
            };

            // The round trip may finish after teardown; its result is dropped.
            if self.cancel.is_cancelled() {
                debug!("discarding poll result after cancellation");
                return RunOutcome::Cancelled;
            }

            let decision = match &result {
                Ok(snapshot) => match self.store.apply_snapshot(snapshot) {
                    Some(view) => {
                        let _ = self
                            .events_tx
                            .send(Event::RunProgress {
                                run_id: run_id.clone(),
                                status: view.status,
                                progress: view.progress,
                                current_step: view.current_step.clone(),
                            })
                            .await;
                        tracker.on_snapshot(snapshot)
                    }
                    None => tracker.on_rejected_snapshot(),
                },
                Err(err) => tracker.on_fault(err),
            };

            match decision {
                PollDecision::Continue | PollDecision::Ignored => {}
                PollDecision::Complete { visualization_id } => {
                    self.store
                        .scratch()
                        .set(ScratchKey::VisualizationId, visualization_id.as_str());
                    info!(%visualization_id, attempts = tracker.attempts(), "run completed");
                    let _ = self
                        .events_tx
                        .send(Event::RunCompleted {
                            run_id: run_id.clone(),
                            visualization_id: visualization_id.clone(),
                        })
                        .await;
                    return RunOutcome::Completed { visualization_id };
                }
                PollDecision::Fail { message } => {
                    self.store.fail_run(&message);
                    warn!(error = %message, attempts = tracker.attempts(), "run failed");
                    let _ = self
                        .events_tx
                        .send(Event::RunFailed {
                            run_id: run_id.clone(),
                            error: message.clone(),
                        })
                        .await;
                    return RunOutcome::Failed { message };
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return RunOutcome::Cancelled,
                _ = tokio::time::sleep(self.settings.interval()) => {}
            }
        }
    }

    /// One poll, bounded by the request timeout. A poll that never answers
    /// counts as a dropped connection.
    async fn poll_once(&self, run_id: &RunId) -> Result<ProgressSnapshot, SourceError> {
        let limit = self.settings.request_timeout();
        match tokio::time::timeout(limit, self.source.poll_progress(run_id)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::ConnectionReset(format!(
                "no response within {} ms",
                limit.as_millis()
            ))),
        }
    }

    /// Like [`PipelineReconciler::start`], with the progress animation
    /// running alongside until the run ends.
    pub async fn start_with_animation(
        &self,
        run_id: RunId,
        simulator: &SimulatorSettings,
    ) -> ReconcileResult<RunOutcome> {
        if !simulator.enabled {
            return self.start(run_id).await;
        }
        self.begin(&run_id).await?;

        let animation_cancel = self.cancel.child_token();
        let animation = tokio::spawn(ProgressSimulator::new(simulator).drive(
            Arc::clone(&self.store),
            simulator.tick(),
            animation_cancel.clone(),
        ));

        let outcome = self.track(run_id).await;

        animation_cancel.cancel();
        if let Err(e) = animation.await {
            warn!(error = %e, "progress animation task failed");
        }
        Ok(outcome)
    }
}
