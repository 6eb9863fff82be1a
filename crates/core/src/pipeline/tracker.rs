//! Poll outcome classification for one pipeline run.
//!
//! [`RunTracker`] turns each poll result into a [`PollDecision`]. It holds no
//! I/O and no timers, so the whole escalation policy can be tested by
//! feeding it results in sequence.

use crate::client::{FaultClass, SourceError};
use sp_protocol::config_models::PollSettings;
use sp_protocol::pipeline_models::{ProgressSnapshot, RunStatus};
use tracing::{debug, error, warn};

pub const GENERIC_FAILURE_MESSAGE: &str = "Processing failed";
pub const TIMEOUT_MESSAGE: &str = "Processing is taking too long. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    /// Keep polling.
    Continue,
    /// The run finished and produced a visualization.
    Complete { visualization_id: String },
    /// The run failed, either as reported or after the client gave up.
    Fail { message: String },
    /// A terminal decision was already made; the result is dropped.
    Ignored,
}

impl PollDecision {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Fail { .. })
    }
}

#[derive(Debug)]
pub struct RunTracker {
    settings: PollSettings,
    attempts: u32,
    consecutive_server_faults: u32,
    finished: bool,
}

impl RunTracker {
    pub fn new(settings: PollSettings) -> Self {
        Self {
            settings,
            attempts: 0,
            consecutive_server_faults: 0,
            finished: false,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn on_result(&mut self, result: &Result<ProgressSnapshot, SourceError>) -> PollDecision {
        match result {
            Ok(snapshot) => self.on_snapshot(snapshot),
            Err(err) => self.on_fault(err),
        }
    }

    pub fn on_snapshot(&mut self, snapshot: &ProgressSnapshot) -> PollDecision {
        if self.finished {
            return PollDecision::Ignored;
        }
        self.attempts += 1;
        self.consecutive_server_faults = 0;

        let decision = match snapshot.status {
            RunStatus::Completed => match snapshot
                .visualization_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
            {
                Some(id) => PollDecision::Complete {
                    visualization_id: id.to_string(),
                },
                None => {
                    warn!("completed without visualization id, polling again");
                    PollDecision::Continue
                }
            },
            RunStatus::Error | RunStatus::Failed => PollDecision::Fail {
                message: snapshot
                    .error_message
                    .as_deref()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(GENERIC_FAILURE_MESSAGE)
                    .to_string(),
            },
            RunStatus::Pending | RunStatus::Processing => PollDecision::Continue,
        };
        self.settle(decision)
    }

    /// A snapshot the store refused, such as one for a different run. It
    /// uses up an attempt but never ends the run.
    pub fn on_rejected_snapshot(&mut self) -> PollDecision {
        if self.finished {
            return PollDecision::Ignored;
        }
        self.attempts += 1;
        self.settle(PollDecision::Continue)
    }

    pub fn on_fault(&mut self, err: &SourceError) -> PollDecision {
        if self.finished {
            return PollDecision::Ignored;
        }
        self.attempts += 1;

        let decision = match err.class() {
            FaultClass::Transient => {
                debug!(error = %err, "transient poll failure, retrying");
                PollDecision::Continue
            }
            FaultClass::NotYetAvailable => {
                debug!("run not available yet, still initializing");
                PollDecision::Continue
            }
            FaultClass::ServerFault | FaultClass::Rejected => {
                self.consecutive_server_faults += 1;
                error!(
                    error = %err,
                    consecutive = self.consecutive_server_faults,
                    "backend refused poll"
                );
                if self.consecutive_server_faults >= self.settings.server_error_threshold {
                    PollDecision::Fail {
                        message: err.to_string(),
                    }
                } else {
                    PollDecision::Continue
                }
            }
            FaultClass::Unexpected => {
                warn!(error = %err, "unexpected poll failure");
                PollDecision::Continue
            }
        };
        self.settle(decision)
    }

    fn settle(&mut self, decision: PollDecision) -> PollDecision {
        let decision = match decision {
            PollDecision::Continue if self.attempts >= self.settings.max_attempts => {
                warn!(attempts = self.attempts, "giving up on run");
                PollDecision::Fail {
                    message: TIMEOUT_MESSAGE.to_string(),
                }
            }
            other => other,
        };
        if decision.is_terminal() {
            self.finished = true;
        }
        decision
    }
}
