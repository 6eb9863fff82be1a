//! Pipeline run tracking.
//!
//! - [`reconciler`]: polls a run until it reaches a terminal outcome
//! - [`tracker`]: classifies poll results and decides when to stop
//! - [`simulator`]: cosmetic progress animation between polls
//! - [`merge`]: combines authoritative and cosmetic progress for display

pub mod merge;
pub mod reconciler;
pub mod simulator;
pub mod tracker;

pub use merge::{merge_display, CosmeticFrame, DisplayProgress, DisplaySource};
pub use reconciler::{PipelineReconciler, ReconcileError, ReconcileResult, RunOutcome};
pub use simulator::ProgressSimulator;
pub use tracker::{PollDecision, RunTracker, GENERIC_FAILURE_MESSAGE, TIMEOUT_MESSAGE};
