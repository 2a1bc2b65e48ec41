use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use wddcore::geometry::adjust::{HD_FRAME_HEIGHT_PX, WDD_PADDING_PX};
use wddcore::geometry::{DistanceMetric, TransformModel};
use wddcore::matching::{MatchPolicy, MatchSettings};

/// Matching parameters, from YAML or from command-line flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub time_tolerance_sec: f64,
    pub coordinate_tolerance_px: f64,
    /// Used when the frame-offset table has no fps for a video.
    pub fps: f64,
    /// Zero-based row holding the annotation sheet's column names.
    pub header_row: usize,
    pub metric: DistanceMetric,
    pub model: TransformModel,
    pub policy: MatchPolicy,
    pub fix_padding: bool,
    pub padding_offset_px: f64,
    pub undo_rotation: bool,
    pub hd_height_px: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            time_tolerance_sec: 0.5,
            coordinate_tolerance_px: 100.0,
            fps: 15.0,
            header_row: 1,
            metric: DistanceMetric::Chebyshev,
            model: TransformModel::Affine,
            policy: MatchPolicy::All,
            fix_padding: false,
            padding_offset_px: WDD_PADDING_PX,
            undo_rotation: false,
            hd_height_px: HD_FRAME_HEIGHT_PX,
        }
    }
}

impl MatcherConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading matcher config {}", path_ref.display()))?;
        let config: MatcherConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing matcher config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(time_tolerance_sec: f64, coordinate_tolerance_px: f64, fps: f64) -> Self {
        Self {
            time_tolerance_sec,
            coordinate_tolerance_px,
            fps,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.fps.is_finite() && self.fps > 0.0,
            "fps must be positive (got {})",
            self.fps
        );
        ensure!(
            self.hd_height_px.is_finite() && self.hd_height_px > 0.0,
            "HD frame height must be positive (got {})",
            self.hd_height_px
        );
        self.to_match_settings()
            .validate()
            .context("validating matcher config")?;
        Ok(())
    }

    pub fn to_match_settings(&self) -> MatchSettings {
        MatchSettings {
            time_tolerance_sec: self.time_tolerance_sec,
            coordinate_tolerance_px: self.coordinate_tolerance_px,
            metric: self.metric,
            policy: self.policy,
            undo_rotation_height_px: self.undo_rotation.then_some(self.hd_height_px),
            padding_offset_px: self.fix_padding.then_some(self.padding_offset_px),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_match_settings() {
        let cfg = MatcherConfig::from_args(1.5, 40.0, 30.0);
        let settings = cfg.to_match_settings();
        assert_eq!(settings.time_tolerance_sec, 1.5);
        assert_eq!(settings.coordinate_tolerance_px, 40.0);
        assert_eq!(settings.padding_offset_px, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_load_reads_yaml_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"time_tolerance_sec: 1.0\nmetric: euclidean\nmodel: similarity\nfix_padding: true\nundo_rotation: true\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = MatcherConfig::load(&path).unwrap();
        assert_eq!(cfg.time_tolerance_sec, 1.0);
        assert_eq!(cfg.coordinate_tolerance_px, 100.0);
        assert_eq!(cfg.metric, DistanceMetric::Euclidean);
        assert_eq!(cfg.model, TransformModel::Similarity);

        let settings = cfg.to_match_settings();
        assert_eq!(settings.padding_offset_px, Some(125.0));
        assert_eq!(settings.undo_rotation_height_px, Some(4608.0));
    }

    #[test]
    fn config_rejects_out_of_range_values() {
        assert!(MatcherConfig::from_args(-0.5, 100.0, 15.0).validate().is_err());
        assert!(MatcherConfig::from_args(0.5, 100.0, 0.0).validate().is_err());
        assert!(MatcherConfig::from_args(0.5, f64::INFINITY, 15.0)
            .validate()
            .is_err());
    }

    #[test]
    fn config_load_reports_unknown_enum_values() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"metric: manhattan\n").unwrap();
        let path = temp.into_temp_path();
        let err = MatcherConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing matcher config"));
    }
}
