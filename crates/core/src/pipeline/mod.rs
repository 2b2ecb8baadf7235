pub mod pipeline_logger;
pub mod tracker_config;
pub mod tracking_pipeline;
pub mod tracking_store;
