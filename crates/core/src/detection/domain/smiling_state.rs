use crate::shared::constants::DEFAULT_SMILING_THRESHOLD;

/// Debounces per-frame smile detections into a stable boolean.
///
/// The counter tracks consecutive frames with at least one smile. It is
/// reset to zero by any smile-less frame and saturates at `threshold + 1`,
/// so arbitrarily long smiling streaks never grow it further.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmilingState {
    counter: u32,
    threshold: u32,
}

impl SmilingState {
    pub fn new(threshold: u32) -> Self {
        Self {
            counter: 0,
            threshold,
        }
    }

    /// Feeds one frame's outcome into the filter.
    pub fn observe(&mut self, smiles_present: bool) {
        if smiles_present {
            self.record_smile();
        } else {
            self.reset();
        }
    }

    pub fn record_smile(&mut self) {
        self.counter = self.counter.saturating_add(1).min(self.ceiling());
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }

    pub fn is_smiling(&self) -> bool {
        self.counter > self.threshold
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    fn ceiling(&self) -> u32 {
        self.threshold.saturating_add(1)
    }
}

impl Default for SmilingState {
    fn default() -> Self {
        Self::new(DEFAULT_SMILING_THRESHOLD)
    }
}
