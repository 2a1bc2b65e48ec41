use crate::geometry::transform::{FrameTransform, TransformModel};
use crate::ingest::MarkerTrack;
use crate::prelude::WddResult;
use chrono::{DateTime, Utc};
use log::{debug, warn};

/// Source of the HD-to-WDD transform at a given instant.
#[derive(Debug, Clone)]
pub enum FrameAlignment {
    /// Both frames already share coordinates.
    Identity,
    /// Fit from the marker snapshots active at the instant.
    Markers {
        hd: MarkerTrack,
        wdd: MarkerTrack,
        model: TransformModel,
    },
}

impl FrameAlignment {
    /// `Ok(None)` when either camera has no marker snapshot at or before
    /// `instant`, or the two snapshots share too few markers for the model.
    pub fn transform_at(&self, instant: DateTime<Utc>) -> WddResult<Option<FrameTransform>> {
        match self {
            FrameAlignment::Identity => Ok(Some(FrameTransform::identity())),
            FrameAlignment::Markers { hd, wdd, model } => {
                let (Some(src), Some(dst)) = (hd.active_at(instant), wdd.active_at(instant)) else {
                    return Ok(None);
                };
                let Some((src_points, dst_points)) = src.paired_with(dst) else {
                    warn!(
                        "HD markers at {} ({}) and WDD markers at {} ({}) cannot be paired",
                        src.timestamp,
                        src.points.len(),
                        dst.timestamp,
                        dst.points.len()
                    );
                    return Ok(None);
                };
                if src_points.len() < model.min_points() {
                    warn!(
                        "only {} shared markers at {}, {} transform needs {}",
                        src_points.len(),
                        instant,
                        model,
                        model.min_points()
                    );
                    return Ok(None);
                }
                let transform = FrameTransform::fit(*model, &src_points, &dst_points)?;
                debug!(
                    "{} transform from markers at {} / {}: rms residual {:.3}px",
                    model,
                    src.timestamp,
                    dst.timestamp,
                    transform.rms_residual(&src_points, &dst_points)
                );
                Ok(Some(transform))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::MarkerSet;
    use crate::prelude::Position;
    use crate::records::parse_timestamp;
    use approx::assert_relative_eq;

    fn snapshot(at: &str, scale: f64, shift: f64) -> MarkerSet {
        MarkerSet {
            timestamp: parse_timestamp(at).unwrap(),
            points: [(0.0, 0.0), (100.0, 0.0), (0.0, 100.0), (100.0, 100.0)]
                .iter()
                .map(|&(x, y)| Position::new(x * scale + shift, y * scale + shift))
                .collect(),
            ids: None,
        }
    }

    fn identified(ids: &[i64], points: &[(f64, f64)]) -> MarkerTrack {
        MarkerTrack::from_snapshots(vec![MarkerSet {
            timestamp: parse_timestamp("2024-09-04T08:00:00").unwrap(),
            points: points.iter().map(|&(x, y)| Position::new(x, y)).collect(),
            ids: Some(ids.to_vec()),
        }])
    }

    #[test]
    fn uses_snapshots_active_at_instant() {
        let alignment = FrameAlignment::Markers {
            hd: MarkerTrack::from_snapshots(vec![snapshot("2024-09-04T08:00:00", 1.0, 0.0)]),
            wdd: MarkerTrack::from_snapshots(vec![
                snapshot("2024-09-04T08:00:00", 0.5, 10.0),
                snapshot("2024-09-04T12:00:00", 0.5, 20.0),
            ]),
            model: TransformModel::Affine,
        };

        let morning = alignment
            .transform_at(parse_timestamp("2024-09-04T09:00:00").unwrap())
            .unwrap()
            .unwrap();
        assert_relative_eq!(morning.forward(Position::new(50.0, 50.0)).x, 35.0, epsilon = 1e-9);

        let afternoon = alignment
            .transform_at(parse_timestamp("2024-09-04T13:00:00").unwrap())
            .unwrap()
            .unwrap();
        assert_relative_eq!(afternoon.forward(Position::new(50.0, 50.0)).x, 45.0, epsilon = 1e-9);

        assert!(alignment
            .transform_at(parse_timestamp("2024-09-04T07:00:00").unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn markers_are_paired_by_id_not_position() {
        // Same frame in both cameras; marker 3 is only seen in HD, 4 only in WDD.
        let alignment = FrameAlignment::Markers {
            hd: identified(&[1, 2, 3], &[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]),
            wdd: identified(&[1, 2, 4], &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)]),
            model: TransformModel::Similarity,
        };
        let transform = alignment
            .transform_at(parse_timestamp("2024-09-04T09:00:00").unwrap())
            .unwrap()
            .unwrap();
        let mapped = transform.forward(Position::new(10.0, 10.0));
        assert_relative_eq!(mapped.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(mapped.y, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn too_few_shared_markers_gives_no_transform() {
        let at = parse_timestamp("2024-09-04T09:00:00").unwrap();
        let by_id = FrameAlignment::Markers {
            hd: identified(&[1, 2, 3], &[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]),
            wdd: identified(&[1, 2, 4], &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)]),
            model: TransformModel::Affine,
        };
        assert!(by_id.transform_at(at).unwrap().is_none());

        let uneven = FrameAlignment::Markers {
            hd: MarkerTrack::from_snapshots(vec![snapshot("2024-09-04T08:00:00", 1.0, 0.0)]),
            wdd: MarkerTrack::from_snapshots(vec![MarkerSet::new(
                parse_timestamp("2024-09-04T08:00:00").unwrap(),
                vec![
                    Position::new(0.0, 0.0),
                    Position::new(50.0, 0.0),
                    Position::new(0.0, 50.0),
                ],
            )]),
            model: TransformModel::Affine,
        };
        assert!(uneven.transform_at(at).unwrap().is_none());
    }

    #[test]
    fn identity_maps_points_unchanged() {
        let transform = FrameAlignment::Identity
            .transform_at(parse_timestamp("2024-09-04T07:00:00").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(transform.forward(Position::new(3.0, 4.0)), Position::new(3.0, 4.0));
    }
}
