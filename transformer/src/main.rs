use anyhow::{bail, Context};
use clap::Parser;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use wddcore::geometry::{FrameTransform, TransformModel};
use wddcore::ingest::{MarkerSet, MarkerTrack};
use wddcore::records::parse_timestamp;

mod points;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Map points between the HD camera frame and the WDD camera frame"
)]
struct Args {
    /// Marker snapshots in the source frame
    #[arg(long)]
    src_markers: PathBuf,
    /// Marker snapshots in the destination frame
    #[arg(long)]
    dst_markers: PathBuf,
    /// Point table with x,y columns
    #[arg(long)]
    input: PathBuf,
    /// Output table; stdout when absent
    #[arg(long)]
    output: Option<PathBuf>,
    /// Use the marker snapshot active at this instant instead of the latest
    #[arg(long)]
    at: Option<String>,
    /// Map destination points back into the source frame
    #[arg(long, default_value_t = false)]
    inverse: bool,
    #[arg(long, default_value_t = TransformModel::Affine)]
    model: TransformModel,
}

fn pick_snapshot<'a>(
    track: &'a MarkerTrack,
    at: Option<chrono::DateTime<chrono::Utc>>,
    path: &Path,
) -> anyhow::Result<&'a MarkerSet> {
    let snapshot = match at {
        Some(instant) => track.active_at(instant),
        None => track.latest(),
    };
    match snapshot {
        Some(snapshot) => Ok(snapshot),
        None => bail!("no marker snapshot in {} for the requested time", path.display()),
    }
}

/// Fits the transform between the snapshots of both tracks selected by `at`.
fn fit_markers(
    src_path: &Path,
    dst_path: &Path,
    at: Option<&str>,
    model: TransformModel,
) -> anyhow::Result<FrameTransform> {
    let at = at
        .map(parse_timestamp)
        .transpose()
        .context("parsing --at timestamp")?;
    let src_track = MarkerTrack::load(src_path)
        .with_context(|| format!("loading source markers {}", src_path.display()))?;
    let dst_track = MarkerTrack::load(dst_path)
        .with_context(|| format!("loading destination markers {}", dst_path.display()))?;
    let src = pick_snapshot(&src_track, at, src_path)?;
    let dst = pick_snapshot(&dst_track, at, dst_path)?;
    if src.timestamp != dst.timestamp {
        warn!(
            "marker snapshots differ in time: source {} vs destination {}",
            src.timestamp, dst.timestamp
        );
    }

    let Some((src_points, dst_points)) = src.paired_with(dst) else {
        bail!(
            "cannot pair {} source markers with {} destination markers without ids",
            src.points.len(),
            dst.points.len()
        );
    };

    let transform = FrameTransform::fit(model, &src_points, &dst_points)
        .with_context(|| format!("fitting {} transform", model))?;
    info!(
        "{} transform {:?}, rms residual {:.3} px",
        model,
        transform.to_array(),
        transform.rms_residual(&src_points, &dst_points)
    );
    Ok(transform)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let transform = fit_markers(
        &args.src_markers,
        &args.dst_markers,
        args.at.as_deref(),
        args.model,
    )?;

    let input = File::open(&args.input)
        .with_context(|| format!("opening points {}", args.input.display()))?;
    let source = points::read_points(BufReader::new(input))
        .with_context(|| format!("reading points {}", args.input.display()))?;
    let mapped = points::map_points(&source, &transform, args.inverse);

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating output directory {}", parent.display()))?;
            }
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            points::write_points(BufWriter::new(file), &mapped)?;
            info!("wrote {} points to {}", mapped.len(), path.display());
        }
        None => points::write_points(io::stdout().lock(), &mapped)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;
    use wddcore::Position;

    fn write_markers(dir: &Path) -> (PathBuf, PathBuf) {
        let src = dir.join("hd.csv");
        let dst = dir.join("wdd.csv");
        fs::write(
            &src,
            "timestamp,x,y,id\n\
             2024-09-04T10:00:00Z,0,0,0\n\
             2024-09-04T10:00:00Z,100,0,1\n\
             2024-09-04T10:00:00Z,0,100,2\n\
             2024-09-04T14:00:00Z,0,0,0\n\
             2024-09-04T14:00:00Z,100,0,1\n\
             2024-09-04T14:00:00Z,0,100,2\n",
        )
        .unwrap();
        fs::write(
            &dst,
            "timestamp,x,y,id\n\
             2024-09-04T10:00:00Z,10,20,0\n\
             2024-09-04T10:00:00Z,60,20,1\n\
             2024-09-04T10:00:00Z,10,70,2\n\
             2024-09-04T14:00:00Z,0,0,0\n\
             2024-09-04T14:00:00Z,200,0,1\n\
             2024-09-04T14:00:00Z,0,200,2\n",
        )
        .unwrap();
        (src, dst)
    }

    #[test]
    fn latest_snapshot_is_the_default() {
        let dir = TempDir::new().unwrap();
        let (src, dst) = write_markers(dir.path());
        let transform = fit_markers(&src, &dst, None, TransformModel::Affine).unwrap();
        let mapped = transform.forward(Position::new(10.0, 5.0));
        assert_relative_eq!(mapped.x, 20.0, epsilon = 1e-9);
        assert_relative_eq!(mapped.y, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn at_selects_the_active_snapshot() {
        let dir = TempDir::new().unwrap();
        let (src, dst) = write_markers(dir.path());
        let transform = fit_markers(
            &src,
            &dst,
            Some("2024-09-04T12:00:00Z"),
            TransformModel::Similarity,
        )
        .unwrap();
        let mapped = transform.forward(Position::new(10.0, 10.0));
        assert_relative_eq!(mapped.x, 15.0, epsilon = 1e-9);
        assert_relative_eq!(mapped.y, 25.0, epsilon = 1e-9);
    }

    #[test]
    fn instant_before_first_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let (src, dst) = write_markers(dir.path());
        let early = fit_markers(&src, &dst, Some("2024-09-04T09:00:00Z"), TransformModel::Affine);
        assert!(early.is_err());
    }

    #[test]
    fn args_default_to_affine_forward() {
        let args = Args::try_parse_from([
            "coordinate-transformer",
            "--src-markers",
            "hd.csv",
            "--dst-markers",
            "wdd.csv",
            "--input",
            "points.csv",
        ])
        .unwrap();
        assert_eq!(args.model, TransformModel::Affine);
        assert!(!args.inverse);
        assert!(args.output.is_none());
    }
}
