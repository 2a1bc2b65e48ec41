use crate::geometry::{DistanceMetric, FrameAlignment};
use crate::ingest::ClassificationIndex;
use crate::matching::candidate::RunMatches;
use crate::matching::classification::ClassificationFilter;
use crate::matching::policy::MatchPolicy;
use crate::matching::spatial::SpatialFilter;
use crate::matching::time_window::TimeWindow;
use crate::prelude::{CandidateFilter, WddError, WddResult};
use crate::records::{DetectionRecord, WaggleRun};
use crate::telemetry::{FunnelMetrics, FunnelSnapshot, RunLog};

/// Tolerances and adjustments applied to every run.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSettings {
    pub time_tolerance_sec: f64,
    pub coordinate_tolerance_px: f64,
    pub metric: DistanceMetric,
    pub policy: MatchPolicy,
    /// HD frame height used to undo the annotator's rotation, when enabled.
    pub undo_rotation_height_px: Option<f64>,
    /// Offset added to WDD positions, when the padding fix is enabled.
    pub padding_offset_px: Option<f64>,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            time_tolerance_sec: 0.5,
            coordinate_tolerance_px: 100.0,
            metric: DistanceMetric::default(),
            policy: MatchPolicy::default(),
            undo_rotation_height_px: None,
            padding_offset_px: None,
        }
    }
}

impl MatchSettings {
    pub fn validate(&self) -> WddResult<()> {
        let non_negative = |name: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(WddError::InvalidConfig(format!(
                    "{} must be a finite, non-negative number (got {})",
                    name, value
                )))
            }
        };
        non_negative("time tolerance", self.time_tolerance_sec)?;
        non_negative("coordinate tolerance", self.coordinate_tolerance_px)?;
        if let Some(height) = self.undo_rotation_height_px {
            if !(height.is_finite() && height > 0.0) {
                return Err(WddError::InvalidConfig(format!(
                    "HD frame height must be positive (got {})",
                    height
                )));
            }
        }
        if let Some(offset) = self.padding_offset_px {
            non_negative("padding offset", offset)?;
        }
        Ok(())
    }
}

/// Runs the filter chain for each annotated waggle and tracks the funnel.
pub struct AnnotationMatcher {
    settings: MatchSettings,
    window: TimeWindow,
    metrics: FunnelMetrics,
    log: RunLog,
}

impl AnnotationMatcher {
    pub fn new(settings: MatchSettings) -> WddResult<Self> {
        settings.validate()?;
        Ok(Self {
            window: TimeWindow::from_seconds(settings.time_tolerance_sec),
            settings,
            metrics: FunnelMetrics::new(),
            log: RunLog::new(),
        })
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Matches one run against the detections of its recording day.
    ///
    /// Returns `None` when no detection falls inside the time window; runs
    /// whose candidates are all rejected later are still reported.
    pub fn match_run(
        &mut self,
        run: &WaggleRun,
        detections: &[DetectionRecord],
        classification: Option<&ClassificationIndex>,
        alignment: &FrameAlignment,
    ) -> WddResult<Option<RunMatches>> {
        self.metrics.record_annotation();

        let mut candidates = self.window.select(run, detections);
        self.metrics.record_stage(TimeWindow::NAME, candidates.len());
        self.log
            .stage(run, TimeWindow::NAME, detections.len(), candidates.len());
        if candidates.is_empty() {
            self.metrics.record_empty_window();
            return Ok(None);
        }

        let classification_filter = classification.map(ClassificationFilter::new);
        let spatial_filter = SpatialFilter::new(alignment, &self.settings);
        let mut filters: Vec<&dyn CandidateFilter> = Vec::with_capacity(3);
        if let Some(filter) = classification_filter.as_ref() {
            filters.push(filter);
        }
        filters.push(&spatial_filter);
        filters.push(&self.settings.policy);

        for filter in filters {
            let before = candidates.len();
            candidates = filter.apply(run, candidates)?;
            self.metrics.record_stage(filter.name(), candidates.len());
            self.log.stage(run, filter.name(), before, candidates.len());
        }

        self.metrics.record_reported(candidates.len());
        Ok(Some(RunMatches {
            run: run.clone(),
            candidates,
        }))
    }

    /// Counts an annotation that could not be placed on the time axis.
    pub fn record_skipped(&mut self, row: usize, reason: &str) {
        self.metrics.record_annotation();
        self.metrics.record_skipped();
        self.log.skipped(row, reason);
    }

    pub fn metrics(&self) -> FunnelSnapshot {
        self.metrics.snapshot()
    }

    /// Logs the funnel at info level and returns it.
    pub fn finish(&self) -> FunnelSnapshot {
        let snapshot = self.metrics.snapshot();
        self.log.summary(&snapshot);
        snapshot
    }
}
