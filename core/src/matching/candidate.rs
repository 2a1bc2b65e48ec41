use crate::prelude::Position;
use crate::records::{DetectionRecord, WaggleRun};

/// A detection paired with one manual annotation.
///
/// Spatial fields stay `None` until the spatial filter has accepted the pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub detection: DetectionRecord,
    /// Detection start minus annotated waggle start.
    pub time_delta_sec: f64,
    /// Detection position after the padding fix, WDD frame.
    pub detection_position: Position,
    /// Annotated waggle start mapped into the WDD frame.
    pub mapped_position: Option<Position>,
    pub distance_px: Option<f64>,
}

impl MatchCandidate {
    pub fn new(detection: DetectionRecord, time_delta_sec: f64) -> Self {
        let detection_position = detection.roi_center;
        Self {
            detection,
            time_delta_sec,
            detection_position,
            mapped_position: None,
            distance_px: None,
        }
    }
}

/// Result for one annotated waggle run whose time window held detections.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMatches {
    pub run: WaggleRun,
    pub candidates: Vec<MatchCandidate>,
}
