use crate::pipeline::tracking_store::TrackingStore;
use crate::shared::frame::Frame;

/// Draws the current detections over the stored frame.
///
/// Renderers only read the store; they never feed anything back into
/// tracking.
pub trait OverlayRenderer: Send {
    fn render(&self, store: &TrackingStore) -> Result<Frame, Box<dyn std::error::Error>>;
}
