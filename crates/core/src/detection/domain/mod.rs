pub mod detection_set;
pub mod region_detector;
pub mod rescale;
pub mod smiling_state;
