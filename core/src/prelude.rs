use crate::matching::MatchCandidate;
use crate::records::WaggleRun;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pixel position in a camera frame.
///
/// Serialized as a two-element `[x, y]` array, which is how WDD metadata
/// stores `roi_center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Position {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Position> for [f64; 2] {
    fn from(position: Position) -> Self {
        [position.x, position.y]
    }
}

/// Common error type for loading inputs, fitting transforms and matching.
#[derive(thiserror::Error, Debug)]
pub enum WddError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: row {row}, column `{column}`: {message}")]
    Table {
        path: PathBuf,
        row: usize,
        column: String,
        message: String,
    },
    #[error("{path}: missing column `{column}`")]
    MissingColumn { path: PathBuf, column: String },
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("spreadsheet error in {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("JSON error in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("archive error in {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("invalid timestamp `{0}`")]
    Timestamp(String),
    #[error("invalid video name `{name}`: {reason}")]
    VideoName { name: String, reason: String },
    #[error("transform needs at least {required} point pairs, got {got}")]
    TooFewPoints { required: usize, got: usize },
    #[error("source has {src} points but destination has {dst}")]
    MismatchedPoints { src: usize, dst: usize },
    #[error("degenerate point configuration: {0}")]
    Degenerate(String),
    #[error("transform is not invertible")]
    NotInvertible,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WddError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WddError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        WddError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type WddResult<T> = Result<T, WddError>;

/// A filtering step applied to the candidates of one waggle run.
///
/// Filters run in sequence; each receives the survivors of the previous one.
pub trait CandidateFilter {
    fn name(&self) -> &'static str;
    fn apply(
        &self,
        run: &WaggleRun,
        candidates: Vec<MatchCandidate>,
    ) -> WddResult<Vec<MatchCandidate>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_serializes_as_pair() {
        let json = serde_json::to_string(&Position::new(1.5, -2.0)).unwrap();
        assert_eq!(json, "[1.5,-2.0]");
        let back: Position = serde_json::from_str("[3, 4]").unwrap();
        assert_eq!(back, Position::new(3.0, 4.0));
    }
}
