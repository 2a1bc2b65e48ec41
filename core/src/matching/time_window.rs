use crate::matching::candidate::MatchCandidate;
use crate::records::{DetectionRecord, WaggleRun};
use chrono::Duration;

/// Keeps detections starting within `tolerance` of the annotated waggle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    tolerance: Duration,
}

impl TimeWindow {
    pub const NAME: &'static str = "time_window";

    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            tolerance: Duration::nanoseconds((seconds * 1e9).round() as i64),
        }
    }

    /// Bounds are inclusive on both ends.
    pub fn select(&self, run: &WaggleRun, detections: &[DetectionRecord]) -> Vec<MatchCandidate> {
        let start = run.waggle_time - self.tolerance;
        let end = run.waggle_time + self.tolerance;
        detections
            .iter()
            .filter(|detection| {
                detection.timestamp_begin >= start && detection.timestamp_begin <= end
            })
            .map(|detection| {
                let delta = detection.timestamp_begin - run.waggle_time;
                MatchCandidate::new(detection.clone(), seconds(delta))
            })
            .collect()
    }
}

fn seconds(delta: Duration) -> f64 {
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::matcher::tests::{detection, run_at};

    #[test]
    fn window_is_inclusive_and_signed() {
        let run = run_at(0.0);
        let detections = vec![
            detection("early", -0.5, 0.0, 0.0),
            detection("edge", 0.5, 0.0, 0.0),
            detection("late", 0.5001, 0.0, 0.0),
            detection("before", -2.0, 0.0, 0.0),
        ];
        let selected = TimeWindow::from_seconds(0.5).select(&run, &detections);
        let ids: Vec<_> = selected.iter().map(|c| c.detection.waggle_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "edge"]);
        assert_eq!(selected[0].time_delta_sec, -0.5);
        assert_eq!(selected[1].time_delta_sec, 0.5);
    }
}
