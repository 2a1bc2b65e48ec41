pub mod log;
pub mod metrics;

pub use log::RunLog;
pub use metrics::{FunnelMetrics, FunnelSnapshot, StageCount};
