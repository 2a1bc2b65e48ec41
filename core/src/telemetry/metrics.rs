use serde::Serialize;
use std::fmt;

/// Candidates surviving one filter, summed over all runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage: String,
    pub candidates: usize,
}

/// Matching funnel for a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FunnelSnapshot {
    pub annotations: usize,
    pub runs_reported: usize,
    pub runs_without_candidates: usize,
    pub runs_skipped: usize,
    pub stages: Vec<StageCount>,
    pub matches: usize,
}

impl fmt::Display for FunnelSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "annotations {}, reported {}, no candidates {}, skipped {}",
            self.annotations, self.runs_reported, self.runs_without_candidates, self.runs_skipped
        )?;
        for stage in &self.stages {
            write!(f, ", {} {}", stage.stage, stage.candidates)?;
        }
        write!(f, ", matches {}", self.matches)
    }
}

pub struct FunnelMetrics {
    inner: FunnelSnapshot,
}

impl FunnelMetrics {
    pub fn new() -> Self {
        Self {
            inner: FunnelSnapshot::default(),
        }
    }

    pub fn record_annotation(&mut self) {
        self.inner.annotations += 1;
    }

    pub fn record_skipped(&mut self) {
        self.inner.runs_skipped += 1;
    }

    pub fn record_empty_window(&mut self) {
        self.inner.runs_without_candidates += 1;
    }

    pub fn record_stage(&mut self, stage: &str, candidates: usize) {
        match self.inner.stages.iter_mut().find(|entry| entry.stage == stage) {
            Some(entry) => entry.candidates += candidates,
            None => self.inner.stages.push(StageCount {
                stage: stage.to_string(),
                candidates,
            }),
        }
    }

    pub fn record_reported(&mut self, matches: usize) {
        self.inner.runs_reported += 1;
        self.inner.matches += matches;
    }

    pub fn snapshot(&self) -> FunnelSnapshot {
        self.inner.clone()
    }
}

impl Default for FunnelMetrics {
    fn default() -> Self {
        Self::new()
    }
}
