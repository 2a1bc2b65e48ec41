pub mod candidate;
pub mod classification;
pub mod matcher;
pub mod policy;
pub mod spatial;
pub mod time_window;

pub use candidate::{MatchCandidate, RunMatches};
pub use classification::ClassificationFilter;
pub use matcher::{AnnotationMatcher, MatchSettings};
pub use policy::MatchPolicy;
pub use spatial::SpatialFilter;
pub use time_window::TimeWindow;
