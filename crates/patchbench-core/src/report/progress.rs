//! Progress events emitted by the runner as candidates and trials complete;
//! the console layer consumes them through a sink.

use crate::model::{Candidate, TrialOutcome};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub enum ProgressEvent<'a> {
    CandidateStarted {
        candidate: &'a Candidate,
        index: usize,
        total: usize,
    },
    TrialFinished {
        candidate: &'a Candidate,
        /// 1-based.
        iteration: u32,
        outcome: &'a TrialOutcome,
    },
}

pub type ProgressSink = Arc<dyn Fn(ProgressEvent<'_>) + Send + Sync>;
