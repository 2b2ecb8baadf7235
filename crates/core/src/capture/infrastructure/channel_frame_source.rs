use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::frame::{Frame, FrameError};

const DEFAULT_CHANNEL_CAPACITY: usize = 4;

/// Frame source fed by a capture thread over a bounded channel.
///
/// Polling drains everything pending and keeps only the newest frame, so a
/// slow consumer skips stale frames instead of falling behind.
pub struct ChannelFrameSource {
    rx: Receiver<Frame>,
    pending: Option<Frame>,
    disconnected: bool,
}

/// Producer half handed to the capture thread.
pub struct FrameSender {
    tx: Sender<Frame>,
    next_index: usize,
}

impl ChannelFrameSource {
    pub fn pair() -> (FrameSender, ChannelFrameSource) {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (FrameSender, ChannelFrameSource) {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        (
            FrameSender { tx, next_index: 0 },
            ChannelFrameSource {
                rx,
                pending: None,
                disconnected: false,
            },
        )
    }

    /// True once the sender is gone and every delivered frame was taken.
    pub fn is_finished(&self) -> bool {
        self.disconnected && self.pending.is_none() && self.rx.is_empty()
    }

    fn drain(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(frame) => self.pending = Some(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
    }
}

impl FrameSource for ChannelFrameSource {
    fn has_new_frame(&mut self) -> bool {
        self.drain();
        self.pending.is_some()
    }

    fn take_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        self.drain();
        Ok(self.pending.take())
    }
}

impl FrameSender {
    /// Stamps the next capture index on the pixels and hands them off.
    ///
    /// Never blocks: when the channel is full the frame is dropped. Returns
    /// `Ok(false)` once the receiving side is gone, and an error without
    /// consuming an index when the pixels do not match the dimensions.
    pub fn send(
        &mut self,
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
    ) -> Result<bool, FrameError> {
        let frame = Frame::new(data, width, height, channels, self.next_index)?;
        self.next_index += 1;
        match self.tx.try_send(frame) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                log::debug!("Frame source full, dropping frame {}", self.next_index - 1);
                Ok(true)
            }
            Err(TrySendError::Disconnected(_)) => Ok(false),
        }
    }
}
