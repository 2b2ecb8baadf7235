use crate::shared::frame::Frame;

/// Delivers captured frames to the tracker.
///
/// Both calls are polls and must never block: capture happens elsewhere
/// (a device thread or callback) and this side only picks up finished
/// frames.
pub trait FrameSource: Send {
    /// Whether a frame newer than the last one taken is ready.
    fn has_new_frame(&mut self) -> bool;

    /// Takes the newest ready frame, or `None` if nothing new arrived.
    fn take_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;
}
