use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use wddcore::geometry::{DistanceMetric, TransformModel};
use wddcore::ingest::DetectionSource;
use wddcore::matching::MatchPolicy;
use workflow::config::MatcherConfig;
use workflow::runner::{Inputs, Runner};

mod report;
mod workflow;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Match manually annotated waggle runs to waggle dance detector output"
)]
struct Args {
    /// Annotation sheet (.xlsx, .xls or .csv)
    annotations: PathBuf,
    /// Detection directory, zip archive or JSON file used for every recording day
    #[arg(long, conflicts_with = "wdd_root", required_unless_present = "wdd_root")]
    detections: Option<PathBuf>,
    /// Root holding wdd_output_<year>/cam0/<year>/<month>/<day>.zip archives
    #[arg(long, alias = "wdd_root")]
    wdd_root: Option<PathBuf>,
    /// Root holding <YYYY-MM-DD>/data.csv classification tables
    #[arg(long, alias = "classification_root")]
    classification_root: Option<PathBuf>,
    /// Marker snapshots in the HD frame
    #[arg(long, requires = "wdd_markers", alias = "hd_markers")]
    hd_markers: Option<PathBuf>,
    /// Marker snapshots in the WDD frame
    #[arg(long, requires = "hd_markers", alias = "wdd_markers")]
    wdd_markers: Option<PathBuf>,
    /// Frame offsets of the annotated videos
    #[arg(long, alias = "frame_offsets")]
    frame_offsets: Option<PathBuf>,
    /// Report path; .json or .csv
    #[arg(long, default_value = "output/matching_waggles.json")]
    output: PathBuf,
    /// Load matching parameters from YAML instead of the tuning flags below;
    /// the two correction switches still apply on top of it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(
        long,
        alias = "time_tolerance_sec",
        default_value_t = 0.5,
        conflicts_with = "config"
    )]
    time_tolerance_sec: f64,
    #[arg(
        long,
        alias = "coordinate_tolerance_px",
        default_value_t = 100.0,
        conflicts_with = "config"
    )]
    coordinate_tolerance_px: f64,
    #[arg(long, default_value_t = 15.0, conflicts_with = "config")]
    fps: f64,
    /// Zero-based row of the annotation column names
    #[arg(long, alias = "header_row", default_value_t = 1, conflicts_with = "config")]
    header_row: usize,
    #[arg(long, default_value_t = DistanceMetric::Chebyshev, conflicts_with = "config")]
    metric: DistanceMetric,
    #[arg(long, default_value_t = TransformModel::Affine, conflicts_with = "config")]
    model: TransformModel,
    #[arg(long, default_value_t = MatchPolicy::All, conflicts_with = "config")]
    policy: MatchPolicy,
    /// Shift detections by the WDD padding before comparing
    #[arg(long, alias = "fix_padding_error", default_value_t = false)]
    fix_padding_error: bool,
    /// Undo the HD frame rotation before mapping annotations
    #[arg(long, alias = "undo_rotation", default_value_t = false)]
    undo_rotation: bool,
}

impl Args {
    fn matcher_config(&self) -> anyhow::Result<MatcherConfig> {
        let mut config = match &self.config {
            Some(path) => MatcherConfig::load(path)?,
            None => MatcherConfig {
                header_row: self.header_row,
                metric: self.metric,
                model: self.model,
                policy: self.policy,
                ..MatcherConfig::from_args(
                    self.time_tolerance_sec,
                    self.coordinate_tolerance_px,
                    self.fps,
                )
            },
        };
        config.fix_padding |= self.fix_padding_error;
        config.undo_rotation |= self.undo_rotation;
        Ok(config)
    }

    fn inputs(&self) -> anyhow::Result<Inputs> {
        let detections = match (&self.detections, &self.wdd_root) {
            (Some(path), _) => DetectionSource::Fixed(path.clone()),
            (None, Some(root)) => DetectionSource::DayArchives(root.clone()),
            (None, None) => anyhow::bail!("either --detections or --wdd-root is required"),
        };
        let markers = self.hd_markers.clone().zip(self.wdd_markers.clone());
        Ok(Inputs {
            annotations: self.annotations.clone(),
            detections,
            classification_root: self.classification_root.clone(),
            markers,
            frame_offsets: self.frame_offsets.clone(),
        })
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args.matcher_config()?;
    let inputs = args.inputs()?;
    if inputs.markers.is_none() {
        log::info!("no marker tables given, treating HD and WDD frames as identical");
    }

    let result = Runner::new(config).execute(&inputs)?;
    let format = report::write_report(&args.output, &result)
        .with_context(|| format!("writing report {}", args.output.display()))?;

    println!(
        "Matched {} video(s) -> {} ({:?})",
        result.videos.len(),
        args.output.display(),
        format
    );
    println!("{}", result.summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detections_and_wdd_root_are_exclusive() {
        assert!(Args::try_parse_from(["annotation-matcher", "a.xlsx"]).is_err());
        assert!(Args::try_parse_from([
            "annotation-matcher",
            "a.xlsx",
            "--detections",
            "wdd",
            "--wdd-root",
            "root",
        ])
        .is_err());

        let args =
            Args::try_parse_from(["annotation-matcher", "a.xlsx", "--wdd_root", "root"]).unwrap();
        assert!(matches!(
            args.inputs().unwrap().detections,
            DetectionSource::DayArchives(_)
        ));
    }

    #[test]
    fn marker_flags_come_in_pairs() {
        assert!(Args::try_parse_from([
            "annotation-matcher",
            "a.xlsx",
            "--detections",
            "wdd",
            "--hd-markers",
            "hd.csv",
        ])
        .is_err());
    }

    #[test]
    fn tuning_flags_conflict_with_config_file() {
        let base = ["annotation-matcher", "a.csv", "--detections", "wdd", "--config", "m.yaml"];
        for extra in [
            &["--metric", "euclidean"][..],
            &["--time-tolerance-sec", "2"][..],
            &["--fps", "30"][..],
        ] {
            let argv: Vec<&str> = base.iter().chain(extra).copied().collect();
            assert!(Args::try_parse_from(argv).is_err());
        }

        let argv: Vec<&str> = base.iter().copied().chain(["--undo-rotation"]).collect();
        let args = Args::try_parse_from(argv).unwrap();
        assert!(args.undo_rotation);
        assert_eq!(args.config, Some(PathBuf::from("m.yaml")));
    }

    #[test]
    fn flags_build_matcher_config() {
        let args = Args::try_parse_from([
            "annotation-matcher",
            "a.csv",
            "--detections",
            "wdd",
            "--coordinate_tolerance_px",
            "25",
            "--metric",
            "euclidean",
            "--policy",
            "nearest",
            "--fix-padding-error",
        ])
        .unwrap();
        let config = args.matcher_config().unwrap();
        assert_eq!(config.coordinate_tolerance_px, 25.0);
        assert_eq!(config.time_tolerance_sec, 0.5);
        assert_eq!(config.metric, DistanceMetric::Euclidean);
        assert_eq!(config.policy, MatchPolicy::Nearest);
        assert!(config.fix_padding);
        assert!(!config.undo_rotation);
        assert_eq!(args.output, PathBuf::from("output/matching_waggles.json"));
    }
}
