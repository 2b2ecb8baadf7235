use std::time::Instant;

use image::GrayImage;
use thiserror::Error;

use crate::capture::domain::frame_source::FrameSource;
use crate::detection::domain::region_detector::{CascadeKind, CascadeSet};
use crate::detection::domain::rescale::{rescale, to_frame};
use crate::detection::infrastructure::analysis_image::{face_region, prepare};
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::pipeline::tracker_config::{ConfigError, TrackerConfig};
use crate::pipeline::tracking_store::TrackingStore;
use crate::shared::frame::Frame;
use crate::shared::rect::{Point, Rect};

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("frame capture failed: {0}")]
    Capture(#[source] Box<dyn std::error::Error>),
    #[error("{kind} detection failed: {source}")]
    Detection {
        kind: CascadeKind,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

/// Per-frame face, smile and eye tracking.
///
/// Each update pulls the newest frame from the source, runs face detection
/// on a downscaled, equalized copy, runs the smile and eye cascades inside
/// every face, maps all results back to full-frame coordinates and feeds
/// the smile count into the debounce filter.
pub struct FaceTracker {
    source: Box<dyn FrameSource>,
    cascades: CascadeSet,
    store: TrackingStore,
    calc_scale: u32,
    logger: Box<dyn PipelineLogger>,
}

impl FaceTracker {
    pub fn new(
        config: &TrackerConfig,
        cascades: CascadeSet,
        source: Box<dyn FrameSource>,
    ) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(Self {
            source,
            cascades,
            store: TrackingStore::new(config.frame_size(), config.smiling_threshold),
            calc_scale: config.calc_scale,
            logger: Box::new(NullPipelineLogger),
        })
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn store(&self) -> &TrackingStore {
        &self.store
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        self.logger.as_ref()
    }

    /// Processes the newest frame if one is ready.
    ///
    /// Returns `Ok(false)` without touching any state when the source has
    /// nothing new.
    pub fn update(&mut self) -> Result<bool, TrackerError> {
        if !self.source.has_new_frame() {
            return Ok(false);
        }
        let Some(frame) = self.source.take_frame().map_err(TrackerError::Capture)? else {
            return Ok(false);
        };

        self.store.set_frame(frame);
        self.process_stored_frame()?;
        Ok(true)
    }

    /// Runs detection on `frame` directly, bypassing the source.
    pub fn process_frame(&mut self, frame: Frame) -> Result<(), TrackerError> {
        self.store.set_frame(frame);
        self.process_stored_frame()
    }

    fn process_stored_frame(&mut self) -> Result<(), TrackerError> {
        let Some(frame) = self.store.frame() else {
            return Ok(());
        };
        let index = frame.index();

        let t0 = Instant::now();
        let small = prepare(frame, self.calc_scale);
        self.logger.timing("prepare", elapsed_ms(t0));

        self.store.detections_mut().clear();

        let t0 = Instant::now();
        if small.width() > 0 && small.height() > 0 {
            self.detect_all(&small)?;
        }
        self.logger.timing("detect", elapsed_ms(t0));

        let smiles_present = !self.store.smiles().is_empty();
        self.store.smiling_mut().observe(smiles_present);

        let detections = self.store.detections();
        self.logger.metric("faces", detections.faces.len() as f64);
        self.logger.metric("smiles", detections.smiles.len() as f64);
        self.logger.metric("eyes", detections.eyes.len() as f64);
        log::debug!(
            "Frame {index}: {} faces, {} smiles, {} eyes, smiling counter {}",
            detections.faces.len(),
            detections.smiles.len(),
            detections.eyes.len(),
            self.store.smiling_counter()
        );
        self.logger.frame_processed(index, self.store.is_smiling());
        Ok(())
    }

    fn detect_all(&mut self, small: &GrayImage) -> Result<(), TrackerError> {
        let scale = self.calc_scale as f32;
        let faces = run(&mut self.cascades, CascadeKind::Face, small)?;

        for face in faces {
            self.store.detections_mut().faces.push(rescale(face, scale));

            let Some((crop_rect, crop)) = face_region(small, &face) else {
                log::debug!("Face {face:?} lies outside the analysis image");
                continue;
            };
            // Sub-detections are relative to the crop, whose origin is the
            // face origin floored to whole analysis pixels.
            let origin = crop_rect.rescale(scale).upper_left();

            let smiles = self.detect_in_face(CascadeKind::Smile, &crop, origin)?;
            self.store.detections_mut().smiles.extend(smiles);

            let left = self.detect_in_face(CascadeKind::LeftEye, &crop, origin)?;
            self.store.last_eyes_mut().update_left(&left);
            self.store.detections_mut().eyes.extend(left);

            let right = self.detect_in_face(CascadeKind::RightEye, &crop, origin)?;
            self.store.last_eyes_mut().update_right(&right);
            self.store.detections_mut().eyes.extend(right);
        }
        Ok(())
    }

    /// Runs one cascade inside a face crop and maps the hits to frame space.
    fn detect_in_face(
        &mut self,
        kind: CascadeKind,
        crop: &GrayImage,
        origin: Point,
    ) -> Result<Vec<Rect>, TrackerError> {
        let scale = self.calc_scale as f32;
        Ok(run(&mut self.cascades, kind, crop)?
            .into_iter()
            .map(|r| to_frame(r, scale, origin))
            .collect())
    }
}

fn run(
    cascades: &mut CascadeSet,
    kind: CascadeKind,
    image: &GrayImage,
) -> Result<Vec<Rect>, TrackerError> {
    cascades
        .get_mut(kind)
        .detect(image)
        .map_err(|source| TrackerError::Detection { kind, source })
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use crate::detection::domain::region_detector::RegionDetector;

    /// Replays one scripted result per call; empty once the script runs out.
    struct ScriptedDetector {
        script: VecDeque<Vec<Rect>>,
        seen_sizes: SeenSizes,
    }

    impl RegionDetector for ScriptedDetector {
        fn detect(&mut self, image: &GrayImage) -> Result<Vec<Rect>, Box<dyn std::error::Error>> {
            self.seen_sizes.lock().unwrap().push(image.dimensions());
            Ok(self.script.pop_front().unwrap_or_default())
        }
    }

    struct FailingDetector;

    impl RegionDetector for FailingDetector {
        fn detect(&mut self, _image: &GrayImage) -> Result<Vec<Rect>, Box<dyn std::error::Error>> {
            Err("cascade exploded".into())
        }
    }

    struct QueueSource {
        frames: VecDeque<Frame>,
    }

    impl FrameSource for QueueSource {
        fn has_new_frame(&mut self) -> bool {
            !self.frames.is_empty()
        }

        fn take_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
            Ok(self.frames.pop_front())
        }
    }

    /// Builds frames from raw pixels the way a camera binding would.
    struct RawSource {
        pixels: Option<(Vec<u8>, u32, u32)>,
    }

    impl FrameSource for RawSource {
        fn has_new_frame(&mut self) -> bool {
            self.pixels.is_some()
        }

        fn take_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
            let Some((data, width, height)) = self.pixels.take() else {
                return Ok(None);
            };
            Ok(Some(Frame::new(data, width, height, 3, 0)?))
        }
    }

    type SeenSizes = Arc<Mutex<Vec<(u32, u32)>>>;

    fn scripted(script: Vec<Vec<Rect>>) -> (Box<dyn RegionDetector>, SeenSizes) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let detector = ScriptedDetector {
            script: script.into(),
            seen_sizes: Arc::clone(&seen),
        };
        (Box::new(detector), seen)
    }

    fn cascades(
        faces: Vec<Vec<Rect>>,
        smiles: Vec<Vec<Rect>>,
        left: Vec<Vec<Rect>>,
        right: Vec<Vec<Rect>>,
    ) -> CascadeSet {
        CascadeSet {
            face: scripted(faces).0,
            smile: scripted(smiles).0,
            left_eye: scripted(left).0,
            right_eye: scripted(right).0,
        }
    }

    fn frame(index: usize) -> Frame {
        Frame::new(vec![128u8; 64 * 48 * 3], 64, 48, 3, index).unwrap()
    }

    fn config() -> TrackerConfig {
        TrackerConfig {
            frame_width: 64,
            frame_height: 48,
            ..Default::default()
        }
    }

    fn tracker(set: CascadeSet, frames: usize) -> FaceTracker {
        let source = QueueSource {
            frames: (0..frames).map(frame).collect(),
        };
        FaceTracker::new(&config(), set, Box::new(source)).unwrap()
    }

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(x, y, w, h)
    }

    #[test]
    fn test_face_rescaled_to_frame() {
        let set = cascades(vec![vec![r(3.0, 4.0, 10.0, 12.0)]], vec![], vec![], vec![]);
        let mut t = tracker(set, 1);
        assert!(t.update().unwrap());
        assert_eq!(t.store().faces(), &[r(6.0, 8.0, 20.0, 24.0)]);
    }

    #[test]
    fn test_smile_offset_by_face_origin() {
        let set = cascades(
            vec![vec![r(5.0, 4.0, 16.0, 16.0)]],
            vec![vec![r(2.0, 9.0, 6.0, 3.0)]],
            vec![],
            vec![],
        );
        let mut t = tracker(set, 1);
        t.update().unwrap();
        // face upper-left in frame: (10, 8)
        assert_eq!(t.store().smiles(), &[r(14.0, 26.0, 12.0, 6.0)]);
    }

    #[test]
    fn test_sub_detectors_see_face_crop() {
        let (smile, seen) = scripted(vec![vec![]]);
        let set = CascadeSet {
            face: scripted(vec![vec![r(5.0, 4.0, 16.0, 10.0)]]).0,
            smile,
            left_eye: scripted(vec![]).0,
            right_eye: scripted(vec![]).0,
        };
        let mut t = tracker(set, 1);
        t.update().unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[(16, 10)]);
    }

    #[test]
    fn test_face_detector_sees_half_size_image() {
        let (face, seen) = scripted(vec![]);
        let set = CascadeSet {
            face,
            smile: scripted(vec![]).0,
            left_eye: scripted(vec![]).0,
            right_eye: scripted(vec![]).0,
        };
        let mut t = tracker(set, 1);
        t.update().unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[(32, 24)]);
    }

    #[test]
    fn test_eyes_from_both_passes_and_last_wins() {
        let set = cascades(
            vec![vec![r(0.0, 0.0, 20.0, 20.0)]],
            vec![],
            vec![vec![r(1.0, 1.0, 2.0, 2.0), r(3.0, 1.0, 2.0, 2.0)]],
            vec![vec![r(10.0, 1.0, 2.0, 2.0)]],
        );
        let mut t = tracker(set, 1);
        t.update().unwrap();
        assert_eq!(t.store().eyes().len(), 3);
        assert_eq!(t.store().last_left_eye(), r(6.0, 2.0, 4.0, 4.0));
        assert_eq!(t.store().last_right_eye(), r(20.0, 2.0, 4.0, 4.0));
    }

    #[test]
    fn test_no_faces_resets_smiling() {
        let face = r(0.0, 0.0, 20.0, 20.0);
        let smile = r(5.0, 12.0, 8.0, 4.0);
        let set = cascades(
            vec![vec![face], vec![face], vec![]],
            vec![vec![smile], vec![smile]],
            vec![],
            vec![],
        );
        let mut t = tracker(set, 3);
        t.update().unwrap();
        t.update().unwrap();
        assert!(t.store().is_smiling());

        t.update().unwrap();
        assert!(t.store().faces().is_empty());
        assert!(t.store().smiles().is_empty());
        assert!(t.store().eyes().is_empty());
        assert_eq!(t.store().smiling_counter(), 0);
        assert!(!t.store().is_smiling());
    }

    #[test]
    fn test_update_without_frame_is_noop() {
        let set = cascades(
            vec![vec![r(0.0, 0.0, 20.0, 20.0)]],
            vec![vec![r(1.0, 1.0, 5.0, 5.0)]],
            vec![vec![r(2.0, 2.0, 3.0, 3.0)]],
            vec![],
        );
        let mut t = tracker(set, 1);
        t.update().unwrap();
        let before = t.store().clone();

        assert!(!t.update().unwrap());
        assert_eq!(t.store(), &before);
    }

    #[test]
    fn test_out_of_bounds_face_is_clamped() {
        // Analysis image is 32x24; face overhangs the right edge.
        let set = cascades(
            vec![vec![r(24.0, 4.0, 16.0, 16.0)]],
            vec![vec![r(1.0, 1.0, 2.0, 2.0)]],
            vec![],
            vec![],
        );
        let mut t = tracker(set, 1);
        t.update().unwrap();
        assert_eq!(t.store().faces(), &[r(48.0, 8.0, 32.0, 32.0)]);
        assert_eq!(t.store().smiles(), &[r(50.0, 10.0, 4.0, 4.0)]);
    }

    #[test]
    fn test_face_fully_outside_gets_no_sub_detections() {
        let (smile, seen) = scripted(vec![vec![r(1.0, 1.0, 2.0, 2.0)]]);
        let set = CascadeSet {
            face: scripted(vec![vec![r(100.0, 100.0, 10.0, 10.0)]]).0,
            smile,
            left_eye: scripted(vec![]).0,
            right_eye: scripted(vec![]).0,
        };
        let mut t = tracker(set, 1);
        t.update().unwrap();
        assert_eq!(t.store().faces().len(), 1);
        assert!(t.store().smiles().is_empty());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_detector_error_propagates() {
        let set = CascadeSet {
            face: scripted(vec![vec![r(0.0, 0.0, 20.0, 20.0)]]).0,
            smile: Box::new(FailingDetector),
            left_eye: scripted(vec![]).0,
            right_eye: scripted(vec![]).0,
        };
        let mut t = tracker(set, 1);
        let err = t.update().unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Detection {
                kind: CascadeKind::Smile,
                ..
            }
        ));
        assert_eq!(t.store().smiling_counter(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = TrackerConfig {
            calc_scale: 0,
            ..Default::default()
        };
        let source = QueueSource {
            frames: VecDeque::new(),
        };
        let set = cascades(vec![], vec![], vec![], vec![]);
        let result = FaceTracker::new(&bad, set, Box::new(source));
        assert!(matches!(result, Err(TrackerError::Config(_))));
    }

    #[test]
    fn test_process_frame_bypasses_source() {
        let set = cascades(vec![vec![r(1.0, 1.0, 4.0, 4.0)]], vec![], vec![], vec![]);
        let mut t = tracker(set, 0);
        t.process_frame(frame(9)).unwrap();
        assert_eq!(t.store().frame().map(Frame::index), Some(9));
        assert_eq!(t.store().faces().len(), 1);
    }

    #[test]
    fn test_fractional_face_offsets_from_pixel_aligned_crop() {
        let set = cascades(
            vec![vec![r(5.5, 4.25, 16.0, 16.0)]],
            vec![vec![r(2.0, 9.0, 6.0, 3.0)]],
            vec![],
            vec![],
        );
        let mut t = tracker(set, 1);
        t.update().unwrap();
        assert_eq!(t.store().faces(), &[r(11.0, 8.5, 32.0, 32.0)]);
        // crop starts at analysis pixel (5, 4), i.e. (10, 8) in the frame
        assert_eq!(t.store().smiles(), &[r(14.0, 26.0, 12.0, 6.0)]);
    }

    #[test]
    fn test_malformed_capture_surfaces_as_capture_error() {
        let source = RawSource {
            pixels: Some((vec![0u8; 10], 64, 48)),
        };
        let set = cascades(vec![], vec![], vec![], vec![]);
        let mut t = FaceTracker::new(&config(), set, Box::new(source)).unwrap();
        let err = t.update().unwrap_err();
        assert!(matches!(err, TrackerError::Capture(_)));
        assert!(t.store().frame().is_none());
    }
}
