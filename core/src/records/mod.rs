pub mod annotation;
pub mod classification;
pub mod detection;
pub mod timestamp;
pub mod video;

pub use annotation::{ManualAnnotation, WaggleRun};
pub use classification::ClassificationRecord;
pub use detection::DetectionRecord;
pub use timestamp::parse_timestamp;
pub use video::CutVideoName;
