use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use wddcore::geometry::FrameTransform;
use wddcore::Position;

#[derive(Debug, Deserialize)]
struct PointRow {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedPoint {
    pub x: f64,
    pub y: f64,
    pub mapped_x: f64,
    pub mapped_y: f64,
}

/// Reads the `x` and `y` columns of a point table; other columns are ignored.
pub fn read_points<R: Read>(reader: R) -> anyhow::Result<Vec<Position>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut points = Vec::new();
    for (index, row) in reader.deserialize::<PointRow>().enumerate() {
        let row = row.with_context(|| format!("reading point on line {}", index + 2))?;
        points.push(Position::new(row.x, row.y));
    }
    Ok(points)
}

pub fn map_points(
    points: &[Position],
    transform: &FrameTransform,
    inverse: bool,
) -> Vec<MappedPoint> {
    points
        .iter()
        .map(|&point| {
            let mapped = if inverse {
                transform.inverse(point)
            } else {
                transform.forward(point)
            };
            MappedPoint {
                x: point.x,
                y: point.y,
                mapped_x: mapped.x,
                mapped_y: mapped.y,
            }
        })
        .collect()
}

pub fn write_points<W: Write>(writer: W, rows: &[MappedPoint]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row).context("writing mapped point")?;
    }
    writer.flush().context("flushing mapped points")?;
    Ok(())
}
