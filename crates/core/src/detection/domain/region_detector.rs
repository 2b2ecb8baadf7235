use image::GrayImage;

use crate::shared::rect::Rect;

/// Domain interface for object detection on a grayscale image region.
///
/// Returned rectangles are in the coordinate space of `image`. Implementations
/// must be deterministic for identical pixels; `&mut self` allows scratch
/// buffers to be reused between calls.
pub trait RegionDetector: Send {
    fn detect(&mut self, image: &GrayImage) -> Result<Vec<Rect>, Box<dyn std::error::Error>>;
}

/// The four detection roles the tracker runs per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeKind {
    Face,
    Smile,
    LeftEye,
    RightEye,
}

impl CascadeKind {
    pub const ALL: &[CascadeKind] = &[
        CascadeKind::Face,
        CascadeKind::Smile,
        CascadeKind::LeftEye,
        CascadeKind::RightEye,
    ];
}

impl std::fmt::Display for CascadeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CascadeKind::Face => write!(f, "face"),
            CascadeKind::Smile => write!(f, "smile"),
            CascadeKind::LeftEye => write!(f, "left eye"),
            CascadeKind::RightEye => write!(f, "right eye"),
        }
    }
}

/// One loaded detector per [`CascadeKind`].
pub struct CascadeSet {
    pub face: Box<dyn RegionDetector>,
    pub smile: Box<dyn RegionDetector>,
    pub left_eye: Box<dyn RegionDetector>,
    pub right_eye: Box<dyn RegionDetector>,
}

impl CascadeSet {
    pub fn get_mut(&mut self, kind: CascadeKind) -> &mut dyn RegionDetector {
        match kind {
            CascadeKind::Face => self.face.as_mut(),
            CascadeKind::Smile => self.smile.as_mut(),
            CascadeKind::LeftEye => self.left_eye.as_mut(),
            CascadeKind::RightEye => self.right_eye.as_mut(),
        }
    }
}
