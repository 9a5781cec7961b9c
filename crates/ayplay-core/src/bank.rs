//! Multi-chip bank for TurboSound configurations.
//!
//! A TurboSound file drives two PSGs through a shared master bus; the bank
//! owns the chips, routes register writes by chip index, and mixes their
//! stereo outputs with normalisation so the sum stays in `[-1, 1]`.

use crate::chip::PsgChip;

/// A bank of one or more PSG chips sharing a master bus.
#[derive(Clone, Debug)]
pub struct PsgBank {
    chips: Vec<PsgChip>,
}

impl PsgBank {
    /// Create a bank of `count` chips with identical clocks.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn new(count: usize, master_clock: u32, sample_rate: u32) -> Self {
        assert!(count > 0, "PSG bank must have at least one chip");
        Self {
            chips: (0..count)
                .map(|_| PsgChip::with_clocks(master_clock, sample_rate))
                .collect(),
        }
    }

    /// Number of chips in the bank.
    #[inline]
    pub fn psg_count(&self) -> usize {
        self.chips.len()
    }

    /// Shared reference to one chip.
    #[inline]
    pub fn chip(&self, index: usize) -> &PsgChip {
        &self.chips[index]
    }

    /// Mutable reference to one chip.
    #[inline]
    pub fn chip_mut(&mut self, index: usize) -> &mut PsgChip {
        &mut self.chips[index]
    }

    /// Write a register on one chip.
    #[inline]
    pub fn write_register(&mut self, psg: usize, register: u8, value: u8) {
        self.chips[psg].write_register(register, value);
    }

    /// Read a register from one chip.
    #[inline]
    pub fn read_register(&self, psg: usize, register: u8) -> u8 {
        self.chips[psg].read_register(register)
    }

    /// Produce one stereo frame with all chips mixed and normalised.
    pub fn render_frame(&mut self) -> (f32, f32) {
        let mut left = 0.0f32;
        let mut right = 0.0f32;
        for chip in &mut self.chips {
            let (l, r) = chip.render_frame();
            left += l;
            right += r;
        }
        let scale = 1.0 / self.chips.len() as f32;
        (left * scale, right * scale)
    }

    /// Set the pan of one channel on every chip.
    pub fn set_channel_pan(&mut self, channel: usize, pan: f32) {
        for chip in &mut self.chips {
            chip.set_channel_pan(channel, pan);
        }
    }

    /// Per-channel levels, taking the loudest chip for each channel.
    pub fn channel_levels(&self) -> [f32; 3] {
        let mut levels = [0.0f32; 3];
        for chip in &self.chips {
            for (slot, level) in levels.iter_mut().zip(chip.channel_levels()) {
                *slot = slot.max(level);
            }
        }
        levels
    }

    /// Reset every chip.
    pub fn reset(&mut self) {
        for chip in &mut self.chips {
            chip.reset();
        }
    }
}
