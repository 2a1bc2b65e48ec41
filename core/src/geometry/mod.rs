pub mod adjust;
pub mod alignment;
pub mod distance;
mod fit;
pub mod transform;

pub use adjust::{fix_padding, unrotate};
pub use alignment::FrameAlignment;
pub use distance::DistanceMetric;
pub use transform::{FrameTransform, TransformModel};
