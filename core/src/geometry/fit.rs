//! Linear least-squares estimation of frame transforms.
//!
//! Points are Hartley-normalized (centroid at the origin, mean distance
//! sqrt(2)) before solving, then the solution is mapped back to pixels.

use crate::geometry::transform::TransformModel;
use crate::prelude::{Position, WddError, WddResult};
use nalgebra::{DMatrix, DVector, Matrix3};
use std::f64::consts::SQRT_2;

const RANK_TOLERANCE: f64 = 1e-10;

pub(crate) fn estimate(
    model: TransformModel,
    src: &[Position],
    dst: &[Position],
) -> WddResult<Matrix3<f64>> {
    let (src_n, t_src) = normalize(src)?;
    let (dst_n, t_dst) = normalize(dst)?;

    let normalized = match model {
        TransformModel::Similarity => similarity(&src_n, &dst_n)?,
        TransformModel::Affine => affine(&src_n, &dst_n)?,
        TransformModel::Projective => projective(&src_n, &dst_n)?,
    };

    let t_dst_inv = t_dst.try_inverse().ok_or(WddError::NotInvertible)?;
    let matrix = t_dst_inv * normalized * t_src;
    let scale = matrix[(2, 2)];
    if !scale.is_finite() || scale.abs() < 1e-12 {
        return Err(WddError::Degenerate("transform maps points to infinity".into()));
    }
    Ok(matrix / scale)
}

fn normalize(points: &[Position]) -> WddResult<(Vec<Position>, Matrix3<f64>)> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    let mean_dist = points
        .iter()
        .map(|p| (p.x - cx).hypot(p.y - cy))
        .sum::<f64>()
        / n;
    if !(mean_dist > 1e-12) {
        return Err(WddError::Degenerate("all points coincide".into()));
    }

    let s = SQRT_2 / mean_dist;
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = points
        .iter()
        .map(|p| Position::new(s * (p.x - cx), s * (p.y - cy)))
        .collect();
    Ok((normalized, t))
}

/// u = a*x - b*y + tx, v = b*x + a*y + ty
fn similarity(src: &[Position], dst: &[Position]) -> WddResult<Matrix3<f64>> {
    let mut a = DMatrix::<f64>::zeros(2 * src.len(), 4);
    let mut b = DVector::<f64>::zeros(2 * src.len());
    for (k, (p, q)) in src.iter().zip(dst).enumerate() {
        let (r0, r1) = (2 * k, 2 * k + 1);
        a[(r0, 0)] = p.x;
        a[(r0, 1)] = -p.y;
        a[(r0, 2)] = 1.0;
        b[r0] = q.x;
        a[(r1, 0)] = p.y;
        a[(r1, 1)] = p.x;
        a[(r1, 3)] = 1.0;
        b[r1] = q.y;
    }
    let x = least_squares(a, b)?;
    Ok(Matrix3::new(x[0], -x[1], x[2], x[1], x[0], x[3], 0.0, 0.0, 1.0))
}

fn affine(src: &[Position], dst: &[Position]) -> WddResult<Matrix3<f64>> {
    let mut a = DMatrix::<f64>::zeros(2 * src.len(), 6);
    let mut b = DVector::<f64>::zeros(2 * src.len());
    for (k, (p, q)) in src.iter().zip(dst).enumerate() {
        let (r0, r1) = (2 * k, 2 * k + 1);
        a[(r0, 0)] = p.x;
        a[(r0, 1)] = p.y;
        a[(r0, 2)] = 1.0;
        b[r0] = q.x;
        a[(r1, 3)] = p.x;
        a[(r1, 4)] = p.y;
        a[(r1, 5)] = 1.0;
        b[r1] = q.y;
    }
    let x = least_squares(a, b)?;
    Ok(Matrix3::new(x[0], x[1], x[2], x[3], x[4], x[5], 0.0, 0.0, 1.0))
}

/// Direct linear transform: h is the right singular vector of A with the
/// smallest singular value.
fn projective(src: &[Position], dst: &[Position]) -> WddResult<Matrix3<f64>> {
    // At least 9 rows so the thin SVD keeps the null-space vector.
    let rows = (2 * src.len()).max(9);
    let mut a = DMatrix::<f64>::zeros(rows, 9);
    for (k, (p, q)) in src.iter().zip(dst).enumerate() {
        let (r0, r1) = (2 * k, 2 * k + 1);
        a[(r0, 0)] = -p.x;
        a[(r0, 1)] = -p.y;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = q.x * p.x;
        a[(r0, 7)] = q.x * p.y;
        a[(r0, 8)] = q.x;
        a[(r1, 3)] = -p.x;
        a[(r1, 4)] = -p.y;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = q.y * p.x;
        a[(r1, 7)] = q.y * p.y;
        a[(r1, 8)] = q.y;
    }

    let svd = a.svd(false, true);
    let mut values: Vec<f64> = svd.singular_values.iter().copied().collect();
    values.sort_by(f64::total_cmp);
    let largest = values.last().copied().unwrap_or(0.0);
    if !(largest > 0.0) || values[1] / largest < RANK_TOLERANCE {
        return Err(WddError::Degenerate(
            "homography is not uniquely determined".into(),
        ));
    }

    let v_t = svd
        .v_t
        .ok_or_else(|| WddError::Degenerate("SVD did not converge".into()))?;
    let h = v_t.row(svd.singular_values.imin());
    Ok(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]))
}

fn least_squares(a: DMatrix<f64>, b: DVector<f64>) -> WddResult<DVector<f64>> {
    let svd = a.svd(true, true);
    let largest = svd.singular_values.max();
    let smallest = svd.singular_values.min();
    if !(largest > 0.0) || smallest / largest < RANK_TOLERANCE {
        return Err(WddError::Degenerate(
            "points do not constrain the transform (collinear markers?)".into(),
        ));
    }
    svd.solve(&b, 1e-14)
        .map_err(|message| WddError::Degenerate(message.to_string()))
}
