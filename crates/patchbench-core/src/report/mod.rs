pub mod console;
pub mod html;
pub mod json;
pub mod progress;

use crate::config::BenchConfig;
use crate::engine::runner::{RunSummary, ThresholdSource};

/// Static text shown alongside the results table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    pub title: String,
    pub description: String,
    pub prompt: String,
    pub iterations: u32,
    pub threshold: u32,
    pub threshold_source: ThresholdSource,
}

impl ReportContext {
    pub fn from_run(cfg: &BenchConfig, summary: &RunSummary) -> Self {
        Self {
            title: cfg.task.title.clone(),
            description: cfg.task.description.clone(),
            prompt: cfg.task.prompt.clone(),
            iterations: cfg.iterations,
            threshold: summary.threshold,
            threshold_source: summary.threshold_source,
        }
    }
}
