use crate::workflow::config::MatcherConfig;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::PathBuf;
use wddcore::geometry::FrameAlignment;
use wddcore::ingest::{
    load_annotations, validate_annotation_path, ClassificationStore, DetectionSource,
    DetectionStore, FrameOffsets, MarkerTrack,
};
use wddcore::matching::{AnnotationMatcher, RunMatches};
use wddcore::records::{CutVideoName, ManualAnnotation, WaggleRun};
use wddcore::telemetry::FunnelSnapshot;

/// Files a matching run reads.
#[derive(Clone, Debug)]
pub struct Inputs {
    pub annotations: PathBuf,
    pub detections: DetectionSource,
    pub classification_root: Option<PathBuf>,
    /// HD and WDD marker tables; both frames are taken as identical without them.
    pub markers: Option<(PathBuf, PathBuf)>,
    pub frame_offsets: Option<PathBuf>,
}

pub struct WorkflowResult {
    /// Reported runs keyed by original video name.
    pub videos: BTreeMap<String, Vec<RunMatches>>,
    pub summary: FunnelSnapshot,
}

#[derive(Clone)]
pub struct Runner {
    config: MatcherConfig,
}

impl Runner {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, inputs: &Inputs) -> anyhow::Result<WorkflowResult> {
        self.config.validate()?;
        validate_annotation_path(&inputs.annotations)?;
        let annotations = load_annotations(&inputs.annotations, self.config.header_row)
            .with_context(|| format!("loading annotations {}", inputs.annotations.display()))?;

        let alignment = match &inputs.markers {
            Some((hd, wdd)) => FrameAlignment::Markers {
                hd: MarkerTrack::load(hd)
                    .with_context(|| format!("loading HD markers {}", hd.display()))?,
                wdd: MarkerTrack::load(wdd)
                    .with_context(|| format!("loading WDD markers {}", wdd.display()))?,
                model: self.config.model,
            },
            None => FrameAlignment::Identity,
        };
        let offsets = match &inputs.frame_offsets {
            Some(path) => Some(
                FrameOffsets::load(path)
                    .with_context(|| format!("loading frame offsets {}", path.display()))?,
            ),
            None => None,
        };

        let mut detections = DetectionStore::new(inputs.detections.clone());
        let mut classification = inputs
            .classification_root
            .as_ref()
            .map(ClassificationStore::new);
        let mut matcher = AnnotationMatcher::new(self.config.to_match_settings())
            .context("initializing annotation matcher")?;

        let mut videos: BTreeMap<String, Vec<RunMatches>> = BTreeMap::new();
        for (video_name, rows) in group_by_video(&annotations) {
            let video = CutVideoName::parse(video_name)
                .with_context(|| format!("parsing video name of row {}", rows[0].row))?;
            let day = video.recording_day();
            let reported = videos
                .entry(video.original_video_name.clone())
                .or_default();

            for annotation in rows {
                let (frame_offset, fps) = match &offsets {
                    None => (0, self.config.fps),
                    Some(table) => match table.lookup(&video) {
                        Some(entry) => (entry.frame_offset, entry.fps.unwrap_or(self.config.fps)),
                        None => {
                            matcher.record_skipped(
                                annotation.row,
                                &format!("no frame offset for {}", video.cut_file_name),
                            );
                            continue;
                        }
                    },
                };
                let run = WaggleRun::new(annotation.clone(), video.clone(), frame_offset, fps);

                let day_detections = detections
                    .for_day(day)
                    .with_context(|| format!("loading detections for {}", day))?;
                let day_classification = match classification.as_mut() {
                    Some(store) => Some(
                        store
                            .for_day(day)
                            .with_context(|| format!("loading classification for {}", day))?,
                    ),
                    None => None,
                };

                if let Some(matches) =
                    matcher.match_run(&run, day_detections, day_classification, &alignment)?
                {
                    reported.push(matches);
                }
            }
        }

        let summary = matcher.finish();
        Ok(WorkflowResult { videos, summary })
    }
}

/// Groups annotations by `video_name`, keeping first-seen order.
fn group_by_video(annotations: &[ManualAnnotation]) -> Vec<(&str, Vec<&ManualAnnotation>)> {
    let mut groups: Vec<(&str, Vec<&ManualAnnotation>)> = Vec::new();
    for annotation in annotations {
        match groups
            .iter_mut()
            .find(|(name, _)| *name == annotation.video_name)
        {
            Some((_, rows)) => rows.push(annotation),
            None => groups.push((annotation.video_name.as_str(), vec![annotation])),
        }
    }
    groups
}
