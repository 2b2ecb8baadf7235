pub mod analysis_image;
pub mod cascade_loader;
pub mod rustface_detector;
