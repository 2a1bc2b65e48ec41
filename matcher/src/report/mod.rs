pub mod json;
pub mod model;
pub mod rows;

use crate::workflow::runner::WorkflowResult;
use anyhow::{bail, Context};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Runs grouped by original video.
    Json,
    /// One row per matched candidate.
    Csv,
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("json") => Ok(ReportFormat::Json),
            Some("csv") => Ok(ReportFormat::Csv),
            _ => bail!(
                "cannot tell report format from {} (use .json or .csv)",
                path.display()
            ),
        }
    }
}

/// Writes the report in the format named by the file extension, creating
/// parent directories as needed.
pub fn write_report(path: &Path, result: &WorkflowResult) -> anyhow::Result<ReportFormat> {
    let format = ReportFormat::from_path(path)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    match format {
        ReportFormat::Json => json::write_json(path, &model::build_report(result))?,
        ReportFormat::Csv => rows::write_csv(path, &rows::match_rows(result))?,
    }
    Ok(format)
}
