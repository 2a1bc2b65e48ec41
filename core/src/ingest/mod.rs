pub mod annotations;
pub mod classification;
pub mod detections;
pub mod markers;
pub mod offsets;
pub mod table;

pub use annotations::{load_annotations, validate_annotation_path};
pub use classification::{ClassificationIndex, ClassificationStore};
pub use detections::{load_detections, DetectionSource, DetectionStore};
pub use markers::{MarkerSet, MarkerTrack};
pub use offsets::{FrameOffset, FrameOffsets};
pub use table::Table;

use std::path::Path;

pub(crate) fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
