use crate::prelude::{WddError, WddResult};
use crate::records::CutVideoName;
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Position of a cut video inside its original recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOffset {
    pub frame_offset: i64,
    pub fps: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OffsetRow {
    video_name: String,
    frame_offset: i64,
    #[serde(default)]
    fps: Option<f64>,
}

/// Frame offsets keyed by video file name, cut or original.
#[derive(Debug, Clone, Default)]
pub struct FrameOffsets {
    by_name: HashMap<String, FrameOffset>,
}

impl FrameOffsets {
    pub fn load(path: &Path) -> WddResult<Self> {
        let mut reader = csv::Reader::from_path(path).map_err(|err| WddError::csv(path, err))?;
        let mut offsets = Self::default();
        for row in reader.deserialize::<OffsetRow>() {
            let row = row.map_err(|err| WddError::csv(path, err))?;
            if let Some(fps) = row.fps {
                if !(fps.is_finite() && fps > 0.0) {
                    return Err(WddError::InvalidConfig(format!(
                        "{}: fps for {} must be positive",
                        path.display(),
                        row.video_name
                    )));
                }
            }
            offsets.insert(
                &row.video_name,
                FrameOffset {
                    frame_offset: row.frame_offset,
                    fps: row.fps,
                },
            );
        }
        info!("loaded {} frame offsets from {}", offsets.len(), path.display());
        Ok(offsets)
    }

    pub fn insert(&mut self, video_name: &str, offset: FrameOffset) {
        let key = Path::new(video_name.trim())
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(video_name)
            .to_string();
        self.by_name.insert(key, offset);
    }

    /// Prefers an entry for the cut video, then one for the original.
    pub fn lookup(&self, video: &CutVideoName) -> Option<FrameOffset> {
        self.by_name
            .get(&video.cut_file_name)
            .or_else(|| self.by_name.get(&video.original_video_name))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn looks_up_by_cut_or_original_name() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"video_name,frame_offset,fps\n\
              ./cam-1_20240904T120000Z--20240904T120500Z_1_2.mp4,120,\n\
              cam-1_20240904T130000Z--20240904T130500Z.mp4,30,14.5\n",
        )
        .unwrap();
        let offsets = FrameOffsets::load(file.path()).unwrap();

        let cut = CutVideoName::parse("cam-1_20240904T120000Z--20240904T120500Z_1_2.mp4").unwrap();
        assert_eq!(
            offsets.lookup(&cut),
            Some(FrameOffset {
                frame_offset: 120,
                fps: None
            })
        );

        let other =
            CutVideoName::parse("cam-1_20240904T130000Z--20240904T130500Z_9_9.mp4").unwrap();
        assert_eq!(offsets.lookup(&other).and_then(|o| o.fps), Some(14.5));

        let missing =
            CutVideoName::parse("cam-1_20240905T130000Z--20240905T130500Z_9_9.mp4").unwrap();
        assert_eq!(offsets.lookup(&missing), None);
    }

    #[test]
    fn rejects_non_positive_fps() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"video_name,frame_offset,fps\nv.mp4,1,0\n").unwrap();
        assert!(FrameOffsets::load(file.path()).is_err());
    }
}
