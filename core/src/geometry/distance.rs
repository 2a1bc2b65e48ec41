use crate::prelude::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How far apart two positions are for the spatial tolerance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Largest per-axis difference; a tolerance is a square box.
    #[default]
    Chebyshev,
    /// Straight-line distance; a tolerance is a circle.
    Euclidean,
}

impl DistanceMetric {
    pub fn measure(self, a: Position, b: Position) -> f64 {
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        match self {
            DistanceMetric::Chebyshev => dx.max(dy),
            DistanceMetric::Euclidean => dx.hypot(dy),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Chebyshev => f.write_str("chebyshev"),
            DistanceMetric::Euclidean => f.write_str("euclidean"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chebyshev" | "box" => Ok(DistanceMetric::Chebyshev),
            "euclidean" | "radius" => Ok(DistanceMetric::Euclidean),
            other => Err(format!(
                "unknown distance metric `{}` (expected chebyshev or euclidean)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_differ_on_diagonals() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(DistanceMetric::Chebyshev.measure(a, b), 4.0);
        assert_eq!(DistanceMetric::Euclidean.measure(a, b), 5.0);
    }

    #[test]
    fn parses_names() {
        assert_eq!(
            "Euclidean".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::Euclidean
        );
        assert!("manhattan".parse::<DistanceMetric>().is_err());
    }
}
