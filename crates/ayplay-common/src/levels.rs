//! Per-channel output level observation buffer.
//!
//! The audio thread publishes channel magnitudes while visualisers read them
//! from any other thread. Stores are last-writer-wins single-word atomics;
//! readers accept tearing across the three channels. No frame-accurate
//! sampling is promised.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Shared, lock-free buffer holding the latest output magnitude of each
/// PSG channel as an `f32` bit pattern.
///
/// Cloning is cheap and shares the underlying storage.
#[derive(Clone, Debug)]
pub struct ChannelLevels {
    inner: Arc<[AtomicU32; 3]>,
}

impl ChannelLevels {
    /// Create a new level buffer with all channels at zero.
    pub fn new() -> Self {
        Self {
            inner: Arc::new([AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)]),
        }
    }

    /// Publish the level of one channel. Out-of-range channels are ignored.
    #[inline]
    pub fn store(&self, channel: usize, level: f32) {
        if let Some(slot) = self.inner.get(channel) {
            slot.store(level.to_bits(), Ordering::Relaxed);
        }
    }

    /// Read the latest levels of all three channels.
    #[inline]
    pub fn load(&self) -> [f32; 3] {
        [
            f32::from_bits(self.inner[0].load(Ordering::Relaxed)),
            f32::from_bits(self.inner[1].load(Ordering::Relaxed)),
            f32::from_bits(self.inner[2].load(Ordering::Relaxed)),
        ]
    }

    /// Reset all channels to zero.
    pub fn clear(&self) {
        for slot in self.inner.iter() {
            slot.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for ChannelLevels {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_load() {
        let levels = ChannelLevels::new();
        levels.store(0, 0.25);
        levels.store(2, 0.75);
        let read = levels.load();
        assert_eq!(read, [0.25, 0.0, 0.75]);
    }

    #[test]
    fn clones_share_storage() {
        let levels = ChannelLevels::new();
        let viewer = levels.clone();
        levels.store(1, 0.5);
        assert_eq!(viewer.load()[1], 0.5);
    }

    #[test]
    fn out_of_range_channel_is_ignored() {
        let levels = ChannelLevels::new();
        levels.store(3, 1.0);
        assert_eq!(levels.load(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn clear_zeroes_all_channels() {
        let levels = ChannelLevels::new();
        for ch in 0..3 {
            levels.store(ch, 0.9);
        }
        levels.clear();
        assert_eq!(levels.load(), [0.0, 0.0, 0.0]);
    }
}
