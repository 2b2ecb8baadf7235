//! Mapping between analysis-image and full-frame coordinates.

use crate::shared::rect::{Point, Rect};

/// Maps a rectangle from the downsampled analysis image to full-frame scale.
pub fn rescale(rect: Rect, factor: f32) -> Rect {
    rect.rescale(factor)
}

pub fn translate(rect: Rect, offset: Point) -> Rect {
    rect.translate(offset)
}

/// Maps a detection made inside a face sub-image to full-frame coordinates.
///
/// `origin` is the face's upper-left corner in full-frame coordinates.
pub fn to_frame(rect: Rect, factor: f32, origin: Point) -> Rect {
    translate(rescale(rect, factor), origin)
}
