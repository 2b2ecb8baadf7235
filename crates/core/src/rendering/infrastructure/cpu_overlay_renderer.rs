use crate::pipeline::tracking_store::TrackingStore;
use crate::rendering::domain::overlay_renderer::OverlayRenderer;
use crate::shared::frame::Frame;
use crate::shared::rect::{Point, Rect};

/// RGB color with straight alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub rgb: [u8; 3],
    pub alpha: f32,
}

pub const FACE_COLOR: Rgba = Rgba {
    rgb: [255, 255, 0],
    alpha: 0.45,
};
pub const SMILE_COLOR: Rgba = Rgba {
    rgb: [0, 0, 255],
    alpha: 0.35,
};
pub const SMILING_COLOR: Rgba = Rgba {
    rgb: [0, 255, 0],
    alpha: 0.35,
};
pub const EYE_COLOR: Rgba = Rgba {
    rgb: [255, 0, 0],
    alpha: 0.35,
};

/// CPU overlay: translucent boxes for faces, translucent discs for smiles
/// and eyes.
///
/// Smiles turn from blue to green once the debounced smiling state is on.
/// Disc radius is half the detection width. Shapes are clipped to the frame.
pub struct CpuOverlayRenderer;

impl CpuOverlayRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpuOverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayRenderer for CpuOverlayRenderer {
    fn render(&self, store: &TrackingStore) -> Result<Frame, Box<dyn std::error::Error>> {
        let source = store.frame().ok_or("No frame captured yet")?;
        let mut canvas = Frame::from_rgb_image(source.to_rgb_image(), source.index());

        for face in store.faces() {
            fill_rect(&mut canvas, face, FACE_COLOR);
        }

        let smile_color = if store.is_smiling() {
            SMILING_COLOR
        } else {
            SMILE_COLOR
        };
        for smile in store.smiles() {
            fill_circle(&mut canvas, smile.center(), smile.width / 2.0, smile_color);
        }

        for eye in store.eyes() {
            fill_circle(&mut canvas, eye.center(), eye.width / 2.0, EYE_COLOR);
        }

        Ok(canvas)
    }
}

fn fill_rect(frame: &mut Frame, rect: &Rect, color: Rgba) {
    let clipped = rect.clamp_to(frame.width() as f32, frame.height() as f32);
    if clipped.is_empty() {
        return;
    }
    let x1 = clipped.x.round() as usize;
    let y1 = clipped.y.round() as usize;
    let x2 = (clipped.x + clipped.width).round() as usize;
    let y2 = (clipped.y + clipped.height).round() as usize;

    let mut pixels = frame.as_ndarray_mut();
    for row in y1..y2 {
        for col in x1..x2 {
            for c in 0..3 {
                let px = &mut pixels[[row, col, c]];
                *px = blend(*px, color.rgb[c], color.alpha);
            }
        }
    }
}

/// Fills pixels whose centers fall inside the circle.
fn fill_circle(frame: &mut Frame, center: Point, radius: f32, color: Rgba) {
    if radius <= 0.0 {
        return;
    }
    let bounds = Rect::new(
        center.x - radius,
        center.y - radius,
        radius * 2.0,
        radius * 2.0,
    )
    .clamp_to(frame.width() as f32, frame.height() as f32);
    if bounds.is_empty() {
        return;
    }

    let x1 = bounds.x.floor() as usize;
    let y1 = bounds.y.floor() as usize;
    let x2 = (bounds.x + bounds.width).ceil() as usize;
    let y2 = (bounds.y + bounds.height).ceil() as usize;
    let r_sq = radius * radius;

    let mut pixels = frame.as_ndarray_mut();
    for row in y1..y2 {
        for col in x1..x2 {
            let dx = col as f32 + 0.5 - center.x;
            let dy = row as f32 + 0.5 - center.y;
            if dx * dx + dy * dy > r_sq {
                continue;
            }
            for c in 0..3 {
                let px = &mut pixels[[row, col, c]];
                *px = blend(*px, color.rgb[c], color.alpha);
            }
        }
    }
}

fn blend(dst: u8, src: u8, alpha: f32) -> u8 {
    (src as f32 * alpha + dst as f32 * (1.0 - alpha))
        .round()
        .clamp(0.0, 255.0) as u8
}
