use crate::prelude::Position;
use crate::records::video::CutVideoName;
use chrono::{DateTime, Duration, Utc};

/// One manually annotated waggle run, as read from the annotation sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualAnnotation {
    /// 1-based sheet row, for diagnostics.
    pub row: usize,
    pub video_name: String,
    pub waggle_index: i64,
    /// Relative to the first frame of the cut video.
    pub waggle_start_frame: f64,
    /// HD camera frame.
    pub waggle_start: Position,
    pub thorax: Option<Position>,
    pub waggle_angle_deg: Option<f64>,
}

/// A manual annotation placed on the absolute time axis of its recording.
#[derive(Debug, Clone, PartialEq)]
pub struct WaggleRun {
    pub annotation: ManualAnnotation,
    pub video: CutVideoName,
    pub frame_offset: i64,
    pub fps: f64,
    pub waggle_time: DateTime<Utc>,
}

impl WaggleRun {
    /// `frame_offset` is the index of the cut video's first frame inside the
    /// original recording.
    pub fn new(
        annotation: ManualAnnotation,
        video: CutVideoName,
        frame_offset: i64,
        fps: f64,
    ) -> Self {
        let frames = frame_offset as f64 + annotation.waggle_start_frame;
        let elapsed = Duration::nanoseconds((frames / fps * 1e9).round() as i64);
        let waggle_time = video.recording_start + elapsed;
        Self {
            annotation,
            video,
            frame_offset,
            fps,
            waggle_time,
        }
    }
}
