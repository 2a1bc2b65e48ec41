use crate::workflow::runner::WorkflowResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use wddcore::matching::{MatchCandidate, RunMatches};
use wddcore::Position;

/// Report keyed by original video name.
pub type ReportModel = BTreeMap<String, Vec<RunReport>>;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub manual_annotation: ManualAnnotationReport,
    pub candidates: Vec<CandidateReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManualAnnotationReport {
    pub row: usize,
    pub waggle_index: i64,
    pub waggle_start_position: Position,
    pub thorax_position: Option<Position>,
    pub waggle_angle_deg: Option<f64>,
    pub waggle_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub waggle_id: String,
    pub timestamp_begin: DateTime<Utc>,
    pub roi_center: Position,
    pub waggle_angle_deg: f64,
    pub waggle_duration: f64,
    pub time_delta_sec: f64,
    pub mapped_position: Option<Position>,
    pub distance_px: Option<f64>,
}

impl From<&MatchCandidate> for CandidateReport {
    fn from(candidate: &MatchCandidate) -> Self {
        let detection = &candidate.detection;
        Self {
            waggle_id: detection.waggle_id.clone(),
            timestamp_begin: detection.timestamp_begin,
            roi_center: detection.roi_center,
            waggle_angle_deg: detection.waggle_angle_deg(),
            waggle_duration: detection.waggle_duration,
            time_delta_sec: candidate.time_delta_sec,
            mapped_position: candidate.mapped_position,
            distance_px: candidate.distance_px,
        }
    }
}

impl From<&RunMatches> for RunReport {
    fn from(matches: &RunMatches) -> Self {
        let annotation = &matches.run.annotation;
        Self {
            manual_annotation: ManualAnnotationReport {
                row: annotation.row,
                waggle_index: annotation.waggle_index,
                waggle_start_position: annotation.waggle_start,
                thorax_position: annotation.thorax,
                waggle_angle_deg: annotation.waggle_angle_deg,
                waggle_time: matches.run.waggle_time,
            },
            candidates: matches.candidates.iter().map(CandidateReport::from).collect(),
        }
    }
}

pub fn build_report(result: &WorkflowResult) -> ReportModel {
    result
        .videos
        .iter()
        .map(|(video, runs)| (video.clone(), runs.iter().map(RunReport::from).collect()))
        .collect()
}
