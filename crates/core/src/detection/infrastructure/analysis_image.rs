//! Builds the reduced, contrast-normalized grayscale image that detection
//! runs on, and crops face sub-regions out of it.

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Grayscale at full resolution, then linear downscale by `calc_scale`, then
/// histogram equalization.
///
/// Dimensions use integer division; a frame smaller than `calc_scale` in
/// either direction yields an empty image.
pub fn prepare(frame: &Frame, calc_scale: u32) -> GrayImage {
    let gray = to_gray(frame);
    let scale = calc_scale.max(1);
    let width = frame.width() / scale;
    let height = frame.height() / scale;
    if width == 0 || height == 0 {
        return GrayImage::new(0, 0);
    }

    let mut small = if scale == 1 {
        gray
    } else {
        imageops::resize(&gray, width, height, FilterType::Triangle)
    };
    imageproc::contrast::equalize_histogram_mut(&mut small);
    small
}

/// Single-channel copy of the frame (Rec. 709 luma for color input).
pub fn to_gray(frame: &Frame) -> GrayImage {
    match frame.channels() {
        1 => GrayImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .unwrap_or_else(|| GrayImage::new(frame.width(), frame.height())),
        _ => imageops::grayscale(&frame.to_rgb_image()),
    }
}

/// Crops `rect` (analysis coordinates) out of `image`, clamped to its bounds.
///
/// Returns the pixel-aligned crop rectangle alongside the crop, or `None`
/// when nothing of `rect` lies inside the image.
pub fn face_region(image: &GrayImage, rect: &Rect) -> Option<(Rect, GrayImage)> {
    let (iw, ih) = image.dimensions();
    let clamped = rect.clamp_to(iw as f32, ih as f32);

    let x1 = clamped.x.floor() as u32;
    let y1 = clamped.y.floor() as u32;
    let x2 = ((clamped.x + clamped.width).ceil() as u32).min(iw);
    let y2 = ((clamped.y + clamped.height).ceil() as u32).min(ih);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    let (w, h) = (x2 - x1, y2 - y1);
    let crop = imageops::crop_imm(image, x1, y1, w, h).to_image();
    Some((Rect::new(x1 as f32, y1 as f32, w as f32, h as f32), crop))
}
