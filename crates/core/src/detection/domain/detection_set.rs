use crate::shared::rect::Rect;

/// Per-frame detections in full-frame coordinates.
///
/// Rebuilt from scratch on every processed frame. Overlapping or duplicate
/// rectangles from the detectors are kept as-is.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionSet {
    pub faces: Vec<Rect>,
    pub smiles: Vec<Rect>,
    pub eyes: Vec<Rect>,
}

impl DetectionSet {
    pub fn clear(&mut self) {
        self.faces.clear();
        self.smiles.clear();
        self.eyes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.smiles.is_empty() && self.eyes.is_empty()
    }
}

/// Most recently seen eye of each side.
///
/// Unlike [`DetectionSet`], these survive frames where no eye is found:
/// a side is only overwritten when that side's detector reports something.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LastEyes {
    pub left: Rect,
    pub right: Rect,
}

impl LastEyes {
    /// Keeps the final rectangle of `found`, if any.
    pub fn update_left(&mut self, found: &[Rect]) {
        if let Some(last) = found.last() {
            self.left = *last;
        }
    }

    pub fn update_right(&mut self, found: &[Rect]) {
        if let Some(last) = found.last() {
            self.right = *last;
        }
    }
}
