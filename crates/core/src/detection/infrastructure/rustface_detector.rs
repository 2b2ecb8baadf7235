use std::fs;
use std::path::Path;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::detection::domain::region_detector::RegionDetector;
use crate::shared::rect::Rect;

use super::cascade_loader::CascadeLoadError;

/// Smallest sliding window rustface accepts.
pub const MIN_WINDOW_SIZE: u32 = 20;

/// Search parameters for one cascade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorTuning {
    pub min_size: u32,
    pub score_threshold: f64,
    pub pyramid_scale_factor: f32,
    pub window_step: u32,
}

impl Default for DetectorTuning {
    fn default() -> Self {
        Self {
            min_size: MIN_WINDOW_SIZE,
            score_threshold: 2.0,
            pyramid_scale_factor: 0.8,
            window_step: 4,
        }
    }
}

impl DetectorTuning {
    /// Checks the ranges rustface would otherwise panic on.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_size < MIN_WINDOW_SIZE {
            return Err(format!(
                "min_size must be at least {MIN_WINDOW_SIZE}, got {}",
                self.min_size
            ));
        }
        if self.score_threshold <= 0.0 {
            return Err(format!(
                "score_threshold must be positive, got {}",
                self.score_threshold
            ));
        }
        if !(0.01..=0.99).contains(&self.pyramid_scale_factor) {
            return Err(format!(
                "pyramid_scale_factor must be between 0.01 and 0.99, got {}",
                self.pyramid_scale_factor
            ));
        }
        if self.window_step == 0 {
            return Err("window_step must be positive".into());
        }
        Ok(())
    }
}

/// Funnel-structured cascade detector backed by the `rustface` crate.
///
/// Loads any SeetaFace-format model. Published SeetaFace funnel models only
/// cover frontal faces; the smile and eye roles need models trained in that
/// format, or another `RegionDetector` plugged into the `CascadeSet`.
pub struct RustfaceDetector {
    inner: Box<dyn rustface::Detector>,
}

// Safety: the rustface detector keeps `Rc` handles that are only shared
// between its own internal classifiers. They move between threads together
// with the detector and are never cloned out of it.
unsafe impl Send for RustfaceDetector {}

impl RustfaceDetector {
    /// Reads and parses a model file. Fails if the tuning is out of range,
    /// the file is missing or it is not a valid model.
    pub fn from_path(path: &Path, tuning: &DetectorTuning) -> Result<Self, CascadeLoadError> {
        tuning
            .validate()
            .map_err(|reason| CascadeLoadError::Tuning {
                path: path.to_path_buf(),
                reason,
            })?;
        let bytes = fs::read(path).map_err(|source| CascadeLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let model =
            rustface::read_model(bytes.as_slice()).map_err(|e| CascadeLoadError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut inner = rustface::create_detector_with_model(model);
        inner.set_min_face_size(tuning.min_size);
        inner.set_score_thresh(tuning.score_threshold);
        inner.set_pyramid_scale_factor(tuning.pyramid_scale_factor);
        inner.set_slide_window_step(tuning.window_step, tuning.window_step);
        Ok(Self { inner })
    }
}

impl RegionDetector for RustfaceDetector {
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<Rect>, Box<dyn std::error::Error>> {
        let (width, height) = image.dimensions();
        if width < MIN_WINDOW_SIZE || height < MIN_WINDOW_SIZE {
            return Ok(Vec::new());
        }

        let mut data = rustface::ImageData::new(image.as_raw(), width, height);
        let found = self
            .inner
            .detect(&mut data)
            .iter()
            .map(|info| {
                let bbox = info.bbox();
                Rect::new(
                    bbox.x() as f32,
                    bbox.y() as f32,
                    bbox.width() as f32,
                    bbox.height() as f32,
                )
            })
            .collect();
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(DetectorTuning::default().validate().is_ok());
    }

    #[rstest]
    #[case::small_window(DetectorTuning { min_size: 10, ..Default::default() })]
    #[case::zero_threshold(DetectorTuning { score_threshold: 0.0, ..Default::default() })]
    #[case::scale_too_large(DetectorTuning { pyramid_scale_factor: 1.0, ..Default::default() })]
    #[case::zero_step(DetectorTuning { window_step: 0, ..Default::default() })]
    fn test_invalid_tuning_rejected(#[case] tuning: DetectorTuning) {
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_out_of_range_tuning_rejected_before_reading() {
        let tuning = DetectorTuning {
            min_size: 5,
            ..Default::default()
        };
        let result = RustfaceDetector::from_path(Path::new("missing.bin"), &tuning);
        match result {
            Err(CascadeLoadError::Tuning { reason, .. }) => assert!(reason.contains("min_size")),
            Err(e) => panic!("expected a tuning error, got {e}"),
            Ok(_) => panic!("expected a tuning error"),
        }
    }

    #[test]
    fn test_missing_model_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.bin");
        let result = RustfaceDetector::from_path(&path, &DetectorTuning::default());
        assert!(matches!(result, Err(CascadeLoadError::Read { .. })));
    }

    #[test]
    fn test_tuning_deserializes_with_defaults() {
        let tuning: DetectorTuning = serde_json::from_str(r#"{"min_size": 40}"#).unwrap();
        assert_eq!(tuning.min_size, 40);
        assert_eq!(tuning.window_step, 4);
    }
}
