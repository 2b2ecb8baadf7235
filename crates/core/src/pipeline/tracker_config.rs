use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::region_detector::CascadeKind;
use crate::detection::infrastructure::cascade_loader::{CascadePaths, CascadeTunings};
use crate::shared::constants::{
    CONFIG_FILENAME, DEFAULT_CALC_SCALE, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH,
    DEFAULT_SMILING_THRESHOLD,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything the tracker needs at construction time.
///
/// Passed explicitly into [`crate::pipeline::tracking_pipeline::FaceTracker`];
/// nothing is resolved from global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Full frame size divided by analysis image size.
    pub calc_scale: u32,
    pub smiling_threshold: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub cascades: CascadePaths,
    pub tuning: CascadeTunings,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            calc_scale: DEFAULT_CALC_SCALE,
            smiling_threshold: DEFAULT_SMILING_THRESHOLD,
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            cascades: CascadePaths::default(),
            tuning: CascadeTunings::default(),
        }
    }
}

impl TrackerConfig {
    /// `~/.config/smile-tracker/tracker.json` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("smile-tracker").join(CONFIG_FILENAME))
    }

    /// Reads a JSON config; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: TrackerConfig =
            serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.calc_scale == 0 {
            return Err(ConfigError::Invalid("calc_scale must be at least 1".into()));
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "frame size must be non-zero, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }
        if self.frame_width < self.calc_scale || self.frame_height < self.calc_scale {
            return Err(ConfigError::Invalid(format!(
                "frame size {}x{} is smaller than calc_scale {}",
                self.frame_width, self.frame_height, self.calc_scale
            )));
        }
        for kind in CascadeKind::ALL {
            self.tuning
                .get(*kind)
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("{kind} tuning: {e}")))?;
        }
        Ok(())
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_match_deployment() {
        let config = TrackerConfig::default();
        assert_eq!(config.calc_scale, 2);
        assert_eq!(config.smiling_threshold, 1);
        assert_eq!(config.frame_size(), (640, 480));
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::zero_scale(TrackerConfig { calc_scale: 0, ..Default::default() })]
    #[case::zero_width(TrackerConfig { frame_width: 0, ..Default::default() })]
    #[case::scale_exceeds_frame(TrackerConfig { frame_height: 3, calc_scale: 4, ..Default::default() })]
    fn test_invalid_configs(#[case] config: TrackerConfig) {
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_tuning_is_reported_with_role() {
        let mut config = TrackerConfig::default();
        config.tuning.smile.min_size = 5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("smile tuning"));
    }

    #[test]
    fn test_load_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, r#"{ "smiling_threshold": 3 }"#).unwrap();

        let config = TrackerConfig::load(&path).unwrap();
        assert_eq!(config.smiling_threshold, 3);
        assert_eq!(config.calc_scale, 2);
        assert_eq!(config.cascades, CascadePaths::default());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, r#"{ "calc_scale": 0 }"#).unwrap();
        assert!(matches!(
            TrackerConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = TrackerConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            TrackerConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_roundtrip_through_json() {
        let mut config = TrackerConfig::default();
        config.cascades = CascadePaths::in_dir(Path::new("/srv/cascades"));
        let json = serde_json::to_string(&config).unwrap();
        let back: TrackerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
