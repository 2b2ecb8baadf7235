use crate::detection::domain::detection_set::{DetectionSet, LastEyes};
use crate::detection::domain::smiling_state::SmilingState;
use crate::shared::frame::Frame;
use crate::shared::rect::{Point, Rect};

/// Latest frame and everything derived from it, as seen by renderers and
/// application logic.
///
/// Read-only outside the crate; only the tracking pipeline mutates it.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackingStore {
    frame: Option<Frame>,
    detections: DetectionSet,
    last_eyes: LastEyes,
    smiling: SmilingState,
    size: (u32, u32),
}

impl TrackingStore {
    pub(crate) fn new(size: (u32, u32), smiling_threshold: u32) -> Self {
        Self {
            frame: None,
            detections: DetectionSet::default(),
            last_eyes: LastEyes::default(),
            smiling: SmilingState::new(smiling_threshold),
            size,
        }
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn detections(&self) -> &DetectionSet {
        &self.detections
    }

    pub fn faces(&self) -> &[Rect] {
        &self.detections.faces
    }

    pub fn smiles(&self) -> &[Rect] {
        &self.detections.smiles
    }

    pub fn eyes(&self) -> &[Rect] {
        &self.detections.eyes
    }

    pub fn last_left_eye(&self) -> Rect {
        self.last_eyes.left
    }

    pub fn last_right_eye(&self) -> Rect {
        self.last_eyes.right
    }

    pub fn is_smiling(&self) -> bool {
        self.smiling.is_smiling()
    }

    pub fn smiling_counter(&self) -> u32 {
        self.smiling.counter()
    }

    /// Upper-left of the first detected face, usable as a pointer position.
    pub fn head_cursor(&self) -> Point {
        self.detections
            .faces
            .first()
            .map(Rect::upper_left)
            .unwrap_or(Point::ZERO)
    }

    /// Configured capture size.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub(crate) fn set_frame(&mut self, frame: Frame) {
        self.frame = Some(frame);
    }

    pub(crate) fn detections_mut(&mut self) -> &mut DetectionSet {
        &mut self.detections
    }

    pub(crate) fn last_eyes_mut(&mut self) -> &mut LastEyes {
        &mut self.last_eyes
    }

    pub(crate) fn smiling_mut(&mut self) -> &mut SmilingState {
        &mut self.smiling
    }
}
