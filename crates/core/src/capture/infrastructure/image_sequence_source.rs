use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Replays a directory of still images as a camera feed.
///
/// Files are taken in lexicographic order, one per poll. Images whose size
/// differs from the configured frame size are resized so every frame has
/// the fixed capture dimensions.
pub struct ImageSequenceSource {
    files: Vec<PathBuf>,
    cursor: usize,
    frame_size: (u32, u32),
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, frame_size: (u32, u32)) -> Result<Self, Box<dyn std::error::Error>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(format!("No images found in {}", dir.display()).into());
        }
        log::info!("Found {} frames in {}", files.len(), dir.display());

        Ok(Self {
            files,
            cursor: 0,
            frame_size,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.files.len() - self.cursor
    }
}

impl FrameSource for ImageSequenceSource {
    fn has_new_frame(&mut self) -> bool {
        self.cursor < self.files.len()
    }

    fn take_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        let index = self.cursor;
        self.cursor += 1;

        let img = image::open(path)?.to_rgb8();
        let (w, h) = self.frame_size;
        let img = if img.dimensions() != (w, h) {
            log::debug!(
                "Resizing {} from {:?} to {w}x{h}",
                path.display(),
                img.dimensions()
            );
            imageops::resize(&img, w, h, FilterType::Triangle)
        } else {
            img
        };

        Ok(Some(Frame::from_rgb_image(img, index)))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
