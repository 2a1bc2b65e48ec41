use crate::records::WaggleRun;
use crate::telemetry::metrics::FunnelSnapshot;
use log::{debug, info, warn};

/// Log sink for per-run matching progress.
pub struct RunLog;

impl RunLog {
    pub fn new() -> Self {
        Self
    }

    pub fn stage(&self, run: &WaggleRun, stage: &str, before: usize, after: usize) {
        debug!(
            "{} run {} (row {}): {} {} -> {}",
            run.video.original_video_name,
            run.annotation.waggle_index,
            run.annotation.row,
            stage,
            before,
            after
        );
    }

    pub fn skipped(&self, row: usize, reason: &str) {
        warn!("skipping annotation row {}: {}", row, reason);
    }

    pub fn summary(&self, snapshot: &FunnelSnapshot) {
        info!("{}", snapshot);
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}
