use crate::geometry::{fix_padding, unrotate, FrameAlignment};
use crate::matching::candidate::MatchCandidate;
use crate::matching::matcher::MatchSettings;
use crate::prelude::{CandidateFilter, WddResult};
use crate::records::WaggleRun;
use log::warn;

/// Keeps detections close to the annotated waggle start once both are in
/// the WDD frame.
pub struct SpatialFilter<'a> {
    alignment: &'a FrameAlignment,
    settings: &'a MatchSettings,
}

impl<'a> SpatialFilter<'a> {
    pub fn new(alignment: &'a FrameAlignment, settings: &'a MatchSettings) -> Self {
        Self {
            alignment,
            settings,
        }
    }
}

impl CandidateFilter for SpatialFilter<'_> {
    fn name(&self) -> &'static str {
        "spatial"
    }

    fn apply(
        &self,
        run: &WaggleRun,
        candidates: Vec<MatchCandidate>,
    ) -> WddResult<Vec<MatchCandidate>> {
        let annotated = match self.settings.undo_rotation_height_px {
            Some(height) => unrotate(run.annotation.waggle_start, height),
            None => run.annotation.waggle_start,
        };

        let mut kept = Vec::with_capacity(candidates.len());
        for mut candidate in candidates {
            let detection = &candidate.detection;
            let Some(transform) = self.alignment.transform_at(detection.timestamp_begin)? else {
                warn!(
                    "no marker snapshot at or before {} (waggle {}), dropping candidate",
                    detection.timestamp_begin, detection.waggle_id
                );
                continue;
            };

            let mapped = transform.forward(annotated);
            let observed = match self.settings.padding_offset_px {
                Some(offset) => fix_padding(detection.roi_center, offset),
                None => detection.roi_center,
            };
            let distance = self.settings.metric.measure(mapped, observed);
            if distance <= self.settings.coordinate_tolerance_px {
                candidate.mapped_position = Some(mapped);
                candidate.detection_position = observed;
                candidate.distance_px = Some(distance);
                kept.push(candidate);
            }
        }
        Ok(kept)
    }
}
