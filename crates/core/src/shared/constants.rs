/// Ratio between the captured frame and the analysis image.
pub const DEFAULT_CALC_SCALE: u32 = 2;

/// Consecutive smile frames that must be exceeded before reporting a smile.
pub const DEFAULT_SMILING_THRESHOLD: u32 = 1;

pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

pub const FACE_CASCADE_NAME: &str = "seeta_fd_frontal_v1.0.bin";
pub const SMILE_CASCADE_NAME: &str = "smile.bin";
pub const LEFT_EYE_CASCADE_NAME: &str = "lefteye.bin";
pub const RIGHT_EYE_CASCADE_NAME: &str = "righteye.bin";

pub const CONFIG_FILENAME: &str = "tracker.json";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
