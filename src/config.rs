// src/config.rs

use crate::error::ConfigError;
use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    /// Read, parse and validate a YAML config. Missing sections and fields
    /// take their defaults, so an empty file is valid.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config = Self::from_yaml(&contents)
            .with_context(|| format!("loading config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        self.crossing.validate()?;
        self.classifier.validate()?;
        self.fusion.validate()?;
        self.feed.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::FusionMode;
    use crate::types::CameraAngle;
    use std::io::Write;

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let file = write_yaml("");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.tracker.zone_half_width, 80.0);
        assert_eq!(config.classifier.min_frames_in_zone, 3);
        assert_eq!(config.fusion.window_seconds, 2.0);
        assert_eq!(config.logging.level, "shot_outcome=info");
    }

    #[test]
    fn test_partial_sections_override_defaults() {
        let file = write_yaml(
            r#"
tracker:
  zone_half_width: 100
  timeout_seconds: 2.5
classifier:
  min_frames_in_zone: 8
fusion:
  mode: recall
  recall_side: far
logging:
  level: shot_outcome=debug
"#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.tracker.zone_half_width, 100.0);
        assert_eq!(config.tracker.zone_half_height, 95.0);
        assert_eq!(config.tracker.timeout_seconds, 2.5);
        assert_eq!(config.classifier.min_frames_in_zone, 8);
        assert_eq!(config.classifier.rim_bounce_ratio, 1.2);
        assert_eq!(config.fusion.mode, FusionMode::Recall);
        assert_eq!(config.fusion.recall_side, CameraAngle::Far);
        assert_eq!(config.logging.level, "shot_outcome=debug");
    }

    #[test]
    fn test_invalid_values_rejected_at_load() {
        let file = write_yaml("tracker:\n  zone_half_width: -5\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("tracker.zone_half_width"));

        let file = write_yaml("crossing:\n  min_ball_hoop_ratio: 0.4\n  max_ball_hoop_ratio: 0.3\n");
        assert!(Config::load(file.path()).is_err());

        let file = write_yaml("fusion:\n  confidence_ceiling: 1.0\n");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_malformed_yaml_and_missing_file() {
        let file = write_yaml("tracker: [1, 2");
        assert!(Config::load(file.path()).is_err());
        assert!(Config::load("/nonexistent/config.yaml").is_err());
    }

    #[test]
    fn test_round_trip_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.crossing.bounce_out_px, 50.0);
        assert_eq!(config.feed.hoop_min_confidence, 0.5);
    }
}
