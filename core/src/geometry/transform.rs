use crate::geometry::fit;
use crate::prelude::{Position, WddError, WddResult};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MIN_DETERMINANT: f64 = 1e-12;

/// Family of transforms fitted between the HD and WDD camera frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformModel {
    /// Rotation, uniform scale and translation.
    Similarity,
    #[default]
    Affine,
    /// Full homography.
    Projective,
}

impl TransformModel {
    pub fn min_points(self) -> usize {
        match self {
            TransformModel::Similarity => 2,
            TransformModel::Affine => 3,
            TransformModel::Projective => 4,
        }
    }
}

impl fmt::Display for TransformModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformModel::Similarity => "similarity",
            TransformModel::Affine => "affine",
            TransformModel::Projective => "projective",
        };
        f.write_str(name)
    }
}

impl FromStr for TransformModel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "similarity" => Ok(TransformModel::Similarity),
            "affine" => Ok(TransformModel::Affine),
            "projective" | "homography" => Ok(TransformModel::Projective),
            other => Err(format!(
                "unknown transform model `{}` (expected similarity, affine or projective)",
                other
            )),
        }
    }
}

/// Mapping between two 2D camera frames with its precomputed inverse.
///
/// `forward` maps source (HD) pixels into destination (WDD) pixels,
/// `inverse` maps back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    forward: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl FrameTransform {
    pub fn identity() -> Self {
        Self {
            forward: Matrix3::identity(),
            inverse: Matrix3::identity(),
        }
    }

    pub fn from_matrix(forward: Matrix3<f64>) -> WddResult<Self> {
        if !forward.iter().all(|value| value.is_finite())
            || forward.determinant().abs() < MIN_DETERMINANT
        {
            return Err(WddError::NotInvertible);
        }
        let inverse = forward.try_inverse().ok_or(WddError::NotInvertible)?;
        Ok(Self { forward, inverse })
    }

    /// Least-squares fit mapping each `src[i]` onto `dst[i]`.
    pub fn fit(model: TransformModel, src: &[Position], dst: &[Position]) -> WddResult<Self> {
        if src.len() != dst.len() {
            return Err(WddError::MismatchedPoints {
                src: src.len(),
                dst: dst.len(),
            });
        }
        if src.len() < model.min_points() {
            return Err(WddError::TooFewPoints {
                required: model.min_points(),
                got: src.len(),
            });
        }
        Self::from_matrix(fit::estimate(model, src, dst)?)
    }

    pub fn forward(&self, point: Position) -> Position {
        apply(&self.forward, point)
    }

    pub fn inverse(&self, point: Position) -> Position {
        apply(&self.inverse, point)
    }

    /// The same transform with source and destination swapped.
    pub fn inverted(&self) -> Self {
        Self {
            forward: self.inverse,
            inverse: self.forward,
        }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.forward
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        let m = &self.forward;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// Root-mean-square forward reprojection error over the point pairs.
    pub fn rms_residual(&self, src: &[Position], dst: &[Position]) -> f64 {
        let count = src.len().min(dst.len());
        if count == 0 {
            return 0.0;
        }
        let sum_sq: f64 = src
            .iter()
            .zip(dst)
            .map(|(&s, d)| {
                let mapped = self.forward(s);
                (mapped.x - d.x).powi(2) + (mapped.y - d.y).powi(2)
            })
            .sum();
        (sum_sq / count as f64).sqrt()
    }
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self::identity()
    }
}

fn apply(matrix: &Matrix3<f64>, point: Position) -> Position {
    let v = matrix * Vector3::new(point.x, point.y, 1.0);
    Position::new(v[0] / v[2], v[1] / v[2])
}
