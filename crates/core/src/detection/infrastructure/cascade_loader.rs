use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::region_detector::{CascadeKind, CascadeSet, RegionDetector};
use crate::shared::constants::{
    FACE_CASCADE_NAME, LEFT_EYE_CASCADE_NAME, RIGHT_EYE_CASCADE_NAME, SMILE_CASCADE_NAME,
};

use super::rustface_detector::{DetectorTuning, RustfaceDetector};

#[derive(Error, Debug)]
pub enum CascadeLoadError {
    #[error("failed to read cascade {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid cascade {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("invalid tuning for {path}: {reason}")]
    Tuning { path: PathBuf, reason: String },
    #[error("failed to load {kind} cascade: {source}")]
    Role {
        kind: CascadeKind,
        #[source]
        source: Box<CascadeLoadError>,
    },
}

/// Locations of the four cascade definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadePaths {
    pub face: PathBuf,
    pub smile: PathBuf,
    pub left_eye: PathBuf,
    pub right_eye: PathBuf,
}

impl CascadePaths {
    /// Default file names resolved against an explicit assets directory.
    pub fn in_dir(assets_dir: &Path) -> Self {
        Self {
            face: assets_dir.join(FACE_CASCADE_NAME),
            smile: assets_dir.join(SMILE_CASCADE_NAME),
            left_eye: assets_dir.join(LEFT_EYE_CASCADE_NAME),
            right_eye: assets_dir.join(RIGHT_EYE_CASCADE_NAME),
        }
    }

    pub fn get(&self, kind: CascadeKind) -> &Path {
        match kind {
            CascadeKind::Face => &self.face,
            CascadeKind::Smile => &self.smile,
            CascadeKind::LeftEye => &self.left_eye,
            CascadeKind::RightEye => &self.right_eye,
        }
    }
}

impl Default for CascadePaths {
    fn default() -> Self {
        Self::in_dir(Path::new("assets"))
    }
}

/// Per-role search parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeTunings {
    pub face: DetectorTuning,
    pub smile: DetectorTuning,
    pub left_eye: DetectorTuning,
    pub right_eye: DetectorTuning,
}

impl CascadeTunings {
    pub fn get(&self, kind: CascadeKind) -> &DetectorTuning {
        match kind {
            CascadeKind::Face => &self.face,
            CascadeKind::Smile => &self.smile,
            CascadeKind::LeftEye => &self.left_eye,
            CascadeKind::RightEye => &self.right_eye,
        }
    }
}

/// Loads all four cascades, failing on the first one that cannot be loaded.
pub fn load_cascades(
    paths: &CascadePaths,
    tunings: &CascadeTunings,
) -> Result<CascadeSet, CascadeLoadError> {
    let load = |kind: CascadeKind| -> Result<Box<dyn RegionDetector>, CascadeLoadError> {
        let path = paths.get(kind);
        log::info!("Loading {kind} cascade: {}", path.display());
        let detector =
            RustfaceDetector::from_path(path, tunings.get(kind)).map_err(|e| {
                CascadeLoadError::Role {
                    kind,
                    source: Box::new(e),
                }
            })?;
        Ok(Box::new(detector))
    };

    Ok(CascadeSet {
        face: load(CascadeKind::Face)?,
        smile: load(CascadeKind::Smile)?,
        left_eye: load(CascadeKind::LeftEye)?,
        right_eye: load(CascadeKind::RightEye)?,
    })
}
