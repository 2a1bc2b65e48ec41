use crate::workflow::runner::WorkflowResult;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// One matched candidate, flattened for spreadsheets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRow {
    pub video_name: String,
    pub annotation_row: usize,
    pub waggle_index: i64,
    pub waggle_time: DateTime<Utc>,
    pub annotated_x: f64,
    pub annotated_y: f64,
    pub manual_angle_deg: Option<f64>,
    pub waggle_id: String,
    pub timestamp_begin: DateTime<Utc>,
    pub time_delta_sec: f64,
    pub mapped_x: Option<f64>,
    pub mapped_y: Option<f64>,
    pub detection_x: f64,
    pub detection_y: f64,
    pub distance_px: Option<f64>,
    pub detection_angle_deg: f64,
    pub waggle_duration: f64,
}

pub fn match_rows(result: &WorkflowResult) -> Vec<MatchRow> {
    let mut rows = Vec::new();
    for (video, runs) in &result.videos {
        for matches in runs {
            let annotation = &matches.run.annotation;
            for candidate in &matches.candidates {
                let detection = &candidate.detection;
                rows.push(MatchRow {
                    video_name: video.clone(),
                    annotation_row: annotation.row,
                    waggle_index: annotation.waggle_index,
                    waggle_time: matches.run.waggle_time,
                    annotated_x: annotation.waggle_start.x,
                    annotated_y: annotation.waggle_start.y,
                    manual_angle_deg: annotation.waggle_angle_deg,
                    waggle_id: detection.waggle_id.clone(),
                    timestamp_begin: detection.timestamp_begin,
                    time_delta_sec: candidate.time_delta_sec,
                    mapped_x: candidate.mapped_position.map(|p| p.x),
                    mapped_y: candidate.mapped_position.map(|p| p.y),
                    detection_x: candidate.detection_position.x,
                    detection_y: candidate.detection_position.y,
                    distance_px: candidate.distance_px,
                    detection_angle_deg: detection.waggle_angle_deg(),
                    waggle_duration: detection.waggle_duration,
                });
            }
        }
    }
    rows
}

pub fn write_csv(path: &Path, rows: &[MatchRow]) -> anyhow::Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
