use crate::prelude::{WddError, WddResult};
use crate::records::timestamp::{parse_timestamp, truncate_fraction_sections};
use chrono::{DateTime, NaiveDate, Utc};
use std::path::Path;

/// Name of a cut dance video and the recording it was cut from.
///
/// Cut videos are named
/// `cam-1_<start>--<end>_<suffix...>.mp4`; the original recording keeps the
/// first two `_` sections.
#[derive(Debug, Clone, PartialEq)]
pub struct CutVideoName {
    pub cut_file_name: String,
    pub original_video_name: String,
    pub recording_start: DateTime<Utc>,
}

impl CutVideoName {
    pub fn parse(relative_path: &str) -> WddResult<Self> {
        let invalid = |reason: &str| WddError::VideoName {
            name: relative_path.to_string(),
            reason: reason.to_string(),
        };

        let path = Path::new(relative_path.trim());
        let cut_file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| invalid("no file name"))?
            .to_string();
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| invalid("no file stem"))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let mut parts = stem.split('_');
        let (camera, span) = match (parts.next(), parts.next()) {
            (Some(camera), Some(span)) if !camera.is_empty() && !span.is_empty() => (camera, span),
            _ => return Err(invalid("expected `<camera>_<start>--<end>` sections")),
        };

        // Some annotation sheets dropped the trailing `Z` of the end stamp.
        let zulu = if span.ends_with('Z') { "" } else { "Z" };
        let original_video_name = format!("{}_{}{}{}", camera, span, zulu, extension);

        let start_text = span.split("--").next().unwrap_or(span);
        let recording_start = parse_timestamp(&truncate_fraction_sections(start_text))
            .map_err(|_| invalid("unparsable recording start"))?;

        Ok(Self {
            cut_file_name,
            original_video_name,
            recording_start,
        })
    }

    pub fn recording_day(&self) -> NaiveDate {
        self.recording_start.date_naive()
    }
}
