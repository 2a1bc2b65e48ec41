use crate::prelude::{Position, WddError, WddResult};
use crate::records::parse_timestamp;
use chrono::{DateTime, Utc};
use log::info;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct MarkerRow {
    timestamp: String,
    x: f64,
    y: f64,
    #[serde(default)]
    id: Option<i64>,
}

/// Reference marker positions valid from `timestamp` onward.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSet {
    pub timestamp: DateTime<Utc>,
    pub points: Vec<Position>,
    /// Marker ids parallel to `points`, when every row carried one.
    pub ids: Option<Vec<i64>>,
}

impl MarkerSet {
    pub fn new(timestamp: DateTime<Utc>, points: Vec<Position>) -> Self {
        Self {
            timestamp,
            points,
            ids: None,
        }
    }

    /// Corresponding point lists of `self` and `other`.
    ///
    /// When both sets carry ids, markers are paired on the ids they share,
    /// in id order. Otherwise they are paired by position, which needs equal
    /// counts; `None` when they differ.
    pub fn paired_with(&self, other: &MarkerSet) -> Option<(Vec<Position>, Vec<Position>)> {
        match (&self.ids, &other.ids) {
            (Some(own_ids), Some(other_ids)) => {
                let theirs: HashMap<i64, Position> = other_ids
                    .iter()
                    .copied()
                    .zip(other.points.iter().copied())
                    .collect();
                Some(
                    own_ids
                        .iter()
                        .zip(&self.points)
                        .filter_map(|(id, &point)| theirs.get(id).map(|&matched| (point, matched)))
                        .unzip(),
                )
            }
            _ if self.points.len() == other.points.len() => {
                Some((self.points.clone(), other.points.clone()))
            }
            _ => None,
        }
    }
}

/// Marker snapshots of one camera, ordered by time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerTrack {
    snapshots: Vec<MarkerSet>,
}

impl MarkerTrack {
    /// Reads a `timestamp,x,y[,id]` table. Rows sharing a timestamp form one
    /// snapshot; points are ordered by `id` when every row has one.
    pub fn load(path: &Path) -> WddResult<Self> {
        let mut reader = csv::Reader::from_path(path).map_err(|err| WddError::csv(path, err))?;
        let mut grouped: BTreeMap<DateTime<Utc>, Vec<(Option<i64>, Position)>> = BTreeMap::new();
        for row in reader.deserialize::<MarkerRow>() {
            let row = row.map_err(|err| WddError::csv(path, err))?;
            let timestamp = parse_timestamp(&row.timestamp)?;
            grouped
                .entry(timestamp)
                .or_default()
                .push((row.id, Position::new(row.x, row.y)));
        }

        let snapshots = grouped
            .into_iter()
            .map(|(timestamp, mut rows)| {
                let ids = if rows.iter().all(|(id, _)| id.is_some()) {
                    rows.sort_by_key(|(id, _)| *id);
                    rows.iter().map(|(id, _)| *id).collect::<Option<Vec<_>>>()
                } else {
                    None
                };
                MarkerSet {
                    timestamp,
                    points: rows.into_iter().map(|(_, point)| point).collect(),
                    ids,
                }
            })
            .collect::<Vec<_>>();
        info!(
            "loaded {} marker snapshots from {}",
            snapshots.len(),
            path.display()
        );
        Ok(Self { snapshots })
    }

    pub fn from_snapshots(mut snapshots: Vec<MarkerSet>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.timestamp);
        Self { snapshots }
    }

    /// Most recent snapshot taken at or before `instant`.
    pub fn active_at(&self, instant: DateTime<Utc>) -> Option<&MarkerSet> {
        let after = self
            .snapshots
            .partition_point(|snapshot| snapshot.timestamp <= instant);
        after.checked_sub(1).map(|index| &self.snapshots[index])
    }

    pub fn latest(&self) -> Option<&MarkerSet> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn track() -> MarkerTrack {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"timestamp,x,y,id\n\
              2024-09-04T08:00:00,30,30,2\n\
              2024-09-04T08:00:00,10,10,1\n\
              2024-09-04T12:00:00,11,11,1\n\
              2024-09-04T12:00:00,31,31,2\n",
        )
        .unwrap();
        MarkerTrack::load(file.path()).unwrap()
    }

    #[test]
    fn groups_rows_into_id_ordered_snapshots() {
        let track = track();
        assert_eq!(track.len(), 2);
        let first = track.active_at(parse_timestamp("2024-09-04T09:00:00").unwrap()).unwrap();
        assert_eq!(
            first.points,
            vec![Position::new(10.0, 10.0), Position::new(30.0, 30.0)]
        );
        assert_eq!(first.ids, Some(vec![1, 2]));
    }

    fn with_ids(ids: &[i64], points: &[(f64, f64)]) -> MarkerSet {
        MarkerSet {
            timestamp: parse_timestamp("2024-09-04T08:00:00").unwrap(),
            points: points.iter().map(|&(x, y)| Position::new(x, y)).collect(),
            ids: Some(ids.to_vec()),
        }
    }

    #[test]
    fn pairs_markers_on_shared_ids() {
        let hd = with_ids(&[1, 2, 3], &[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        let wdd = with_ids(&[1, 2, 4], &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)]);
        let (src, dst) = hd.paired_with(&wdd).unwrap();
        assert_eq!(src, vec![Position::new(0.0, 0.0), Position::new(100.0, 0.0)]);
        assert_eq!(dst, src);
    }

    #[test]
    fn positional_pairing_needs_equal_counts() {
        let at = parse_timestamp("2024-09-04T08:00:00").unwrap();
        let three = MarkerSet::new(at, vec![Position::new(0.0, 0.0); 3]);
        let four = MarkerSet::new(at, vec![Position::new(0.0, 0.0); 4]);
        assert!(three.paired_with(&four).is_none());
        assert_eq!(three.paired_with(&three).map(|(src, _)| src.len()), Some(3));
    }

    #[test]
    fn picks_most_recent_snapshot_not_after_instant() {
        let track = track();
        let at = |text: &str| {
            track
                .active_at(parse_timestamp(text).unwrap())
                .map(|s| s.points[0].x)
        };
        assert_eq!(at("2024-09-04T07:59:59"), None);
        assert_eq!(at("2024-09-04T08:00:00"), Some(10.0));
        assert_eq!(at("2024-09-04T11:59:59"), Some(10.0));
        assert_eq!(at("2024-09-04T12:00:00"), Some(11.0));
        assert_eq!(track.latest().map(|s| s.points[0].x), Some(11.0));
    }

    #[test]
    fn keeps_file_order_without_ids() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"timestamp,x,y\n2024-09-04T08:00:00,5,5\n2024-09-04T08:00:00,1,1\n")
            .unwrap();
        let track = MarkerTrack::load(file.path()).unwrap();
        assert_eq!(track.latest().unwrap().points[0], Position::new(5.0, 5.0));
    }
}
