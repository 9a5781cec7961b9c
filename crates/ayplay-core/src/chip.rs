//! PSG chip emulation.
//!
//! The chip runs in two clocks at once: its internal state machines advance
//! at `master_clock / 8` (250 kHz on an Atari ST, ~221 kHz on a Spectrum)
//! while output frames are produced at the host sample rate. A fractional
//! tick accumulator carries the remainder across samples so the long-run
//! rate is exact.

use ayplay_common::{ATARI_ST_CLOCK, ChannelLevels, DEFAULT_SAMPLE_RATE};

use crate::generators::{EnvelopeGenerator, NUM_CHANNELS, NoiseGenerator, ToneGenerator};
use crate::mixer::{MixerState, Panner};
use crate::tables::{REG_MASK, VOLUME_TABLE};

/// Number of addressable sound registers (R0-R13).
pub const NUM_REGISTERS: usize = 14;

/// AY-3-8910 / YM2149 Programmable Sound Generator.
///
/// Each call to [`render_frame`](PsgChip::render_frame) advances the internal
/// state machines by the appropriate number of internal ticks and produces
/// one stereo sample. Tone and noise outputs are OR-accumulated across those
/// ticks: a tone whose frequency exceeds Nyquist degrades gracefully to a
/// sustained open gate instead of aliasing.
#[derive(Clone, Debug)]
pub struct PsgChip {
    internal_clock: u32,
    sample_rate: u32,
    ticks_per_sample: f64,
    tick_accumulator: f64,

    registers: [u8; NUM_REGISTERS],

    tones: [ToneGenerator; NUM_CHANNELS],
    noise: NoiseGenerator,
    envelope: EnvelopeGenerator,
    mixer: MixerState,

    panners: [Panner; NUM_CHANNELS],
    drum_override: [Option<f32>; NUM_CHANNELS],
    levels: ChannelLevels,
}

impl PsgChip {
    /// Create a chip with Atari ST defaults (2 MHz master, 44.1 kHz output).
    pub fn new() -> Self {
        Self::with_clocks(ATARI_ST_CLOCK, DEFAULT_SAMPLE_RATE)
    }

    /// Create a chip with explicit master clock and output sample rate.
    pub fn with_clocks(master_clock: u32, sample_rate: u32) -> Self {
        let internal_clock = (master_clock / 8).max(1);
        let sample_rate = sample_rate.max(1);
        let mut chip = Self {
            internal_clock,
            sample_rate,
            ticks_per_sample: f64::from(internal_clock) / f64::from(sample_rate),
            tick_accumulator: 0.0,
            registers: [0; NUM_REGISTERS],
            tones: [
                ToneGenerator::new(),
                ToneGenerator::new(),
                ToneGenerator::new(),
            ],
            noise: NoiseGenerator::new(),
            envelope: EnvelopeGenerator::new(),
            mixer: MixerState::default(),
            panners: [Panner::new(), Panner::new(), Panner::new()],
            drum_override: [None; NUM_CHANNELS],
            levels: ChannelLevels::new(),
        };
        chip.reset();
        chip
    }

    /// Reset all generators and registers to power-on state.
    ///
    /// Keeps the clock configuration, pan positions and the shared level
    /// buffer; resetting is idempotent.
    pub fn reset(&mut self) {
        for tone in &mut self.tones {
            tone.reset();
        }
        self.noise.reset();
        self.envelope.reset();
        self.drum_override = [None; NUM_CHANNELS];
        self.tick_accumulator = 0.0;
        self.registers = [0; NUM_REGISTERS];
        // R7 = 0x3F: all mixer inputs disabled.
        self.apply_register(7, 0x3F);
    }

    /// Output sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Internal clock (master / 8) in Hz.
    #[inline]
    pub fn internal_clock(&self) -> u32 {
        self.internal_clock
    }

    /// Write a sound register (R0-R13). Out-of-range registers are ignored;
    /// values are masked to their hardware width.
    pub fn write_register(&mut self, register: u8, value: u8) {
        self.apply_register(register as usize, value);
    }

    /// Read back a sound register.
    pub fn read_register(&self, register: u8) -> u8 {
        self.registers
            .get(register as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Register image (R0-R13), for debugging and tests.
    pub fn dump_registers(&self) -> [u8; NUM_REGISTERS] {
        self.registers
    }

    fn apply_register(&mut self, register: usize, value: u8) {
        if register >= NUM_REGISTERS {
            return;
        }
        let value = value & REG_MASK[register];
        self.registers[register] = value;

        match register {
            0..=5 => {
                let channel = register / 2;
                let period = self.tone_period(channel);
                self.tones[channel].set_period(period);
            }
            6 => self.noise.set_period(u32::from(value)),
            7 => self.mixer.set_from_register(value),
            11 | 12 => {
                let period = self.envelope_period();
                self.envelope.set_period(period);
            }
            13 => self.envelope.set_shape(value),
            _ => {}
        }
    }

    #[inline]
    fn tone_period(&self, channel: usize) -> u32 {
        let base = channel * 2;
        (u32::from(self.registers[base + 1]) << 8) | u32::from(self.registers[base])
    }

    #[inline]
    fn envelope_period(&self) -> u32 {
        (u32::from(self.registers[12]) << 8) | u32::from(self.registers[11])
    }

    /// Restart the envelope without a shape write (Sync Buzzer retrigger).
    #[inline]
    pub fn trigger_envelope(&mut self) {
        self.envelope.trigger();
    }

    /// Current envelope position, for effect diagnostics and tests.
    #[inline]
    pub fn envelope_position(&self) -> i32 {
        self.envelope.position()
    }

    /// Override a channel's DAC output with a DigiDrum sample value
    /// (already normalised; `None` returns the channel to the mixer gate).
    #[inline]
    pub fn set_drum_override(&mut self, channel: usize, sample: Option<f32>) {
        if channel < NUM_CHANNELS {
            self.drum_override[channel] = sample;
        }
    }

    /// Set the stereo position of a channel (clamped to `[-1, 1]`).
    pub fn set_channel_pan(&mut self, channel: usize, pan: f32) {
        if channel < NUM_CHANNELS {
            self.panners[channel].set(pan);
        }
    }

    /// Latest per-channel output magnitudes.
    pub fn channel_levels(&self) -> [f32; 3] {
        self.levels.load()
    }

    /// Handle to the shared level buffer for external visualisers.
    pub fn levels_handle(&self) -> ChannelLevels {
        self.levels.clone()
    }

    /// Produce one stereo output frame, advancing the internal clock.
    pub fn render_frame(&mut self) -> (f32, f32) {
        self.tick_accumulator += self.ticks_per_sample;
        let ticks = self.tick_accumulator as u32;
        self.tick_accumulator -= f64::from(ticks);

        // OR-accumulate the gate inputs across this sample's internal ticks.
        let mut tone_gate = [
            self.tones[0].output(),
            self.tones[1].output(),
            self.tones[2].output(),
        ];
        let mut noise_gate = self.noise.output();
        for _ in 0..ticks {
            for (gate, tone) in tone_gate.iter_mut().zip(self.tones.iter_mut()) {
                *gate |= tone.tick();
            }
            noise_gate |= self.noise.tick();
            self.envelope.tick();
        }

        let envelope_level = self.envelope.level() as usize;
        let mut left = 0.0f32;
        let mut right = 0.0f32;
        for channel in 0..NUM_CHANNELS {
            let sample = if let Some(drum) = self.drum_override[channel] {
                drum
            } else {
                let gate = (tone_gate[channel] || self.mixer.tone_disabled(channel))
                    && (noise_gate || self.mixer.noise_disabled(channel));
                if gate {
                    let volume_reg = self.registers[8 + channel];
                    let index = if volume_reg & 0x10 != 0 {
                        envelope_level
                    } else {
                        usize::from((volume_reg & 0x0F) << 1)
                    };
                    VOLUME_TABLE[index]
                } else {
                    0.0
                }
            };
            self.levels.store(channel, sample);
            left += sample * self.panners[channel].left();
            right += sample * self.panners[channel].right();
        }

        (left / 3.0, right / 3.0)
    }

    /// Fill a pair of stereo buffers. Both slices must have equal length.
    pub fn generate_into(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (sl, sr) = self.render_frame();
            *l = sl;
            *r = sr;
        }
    }
}

impl Default for PsgChip {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_a_chip() -> PsgChip {
        let mut chip = PsgChip::with_clocks(2_000_000, 48_000);
        chip.write_register(0, 0x01); // period 1
        chip.write_register(1, 0x00);
        chip.write_register(8, 0x0F); // fixed volume 15
        chip.write_register(7, 0x3E); // tone A only
        chip
    }

    #[test]
    fn new_chip_uses_default_clocks() {
        let chip = PsgChip::new();
        assert_eq!(chip.sample_rate(), 44_100);
        assert_eq!(chip.internal_clock(), 250_000);
    }

    #[test]
    fn register_values_are_masked() {
        let mut chip = PsgChip::new();
        chip.write_register(1, 0xFF);
        assert_eq!(chip.read_register(1), 0x0F);
        chip.write_register(6, 0xFF);
        assert_eq!(chip.read_register(6), 0x1F);
        chip.write_register(8, 0xFF);
        assert_eq!(chip.read_register(8), 0x1F);
    }

    #[test]
    fn reset_is_idempotent_and_restores_power_on_state() {
        let mut chip = PsgChip::new();
        chip.write_register(0, 0x55);
        chip.write_register(8, 0x0F);
        let _ = chip.render_frame();

        chip.reset();
        let after_first = chip.dump_registers();
        chip.reset();
        assert_eq!(chip.dump_registers(), after_first);
        assert_eq!(chip.read_register(7), 0x3F);
        assert_eq!(chip.read_register(0), 0);
        assert_eq!(chip.read_register(8), 0);
    }

    #[test]
    fn nyquist_folding_keeps_the_gate_open() {
        // Tone period 1 at 250 kHz internal clock toggles at 125 kHz, far
        // above Nyquist at 48 kHz; OR-accumulation across the ~5 internal
        // ticks per sample must hold the gate open every sample.
        let mut chip = tone_a_chip();
        let expected = VOLUME_TABLE[usize::from(15u8 << 1)];
        for _ in 0..64 {
            let (left, right) = chip.render_frame();
            let mono = left + right;
            assert!(
                (mono - expected * 2.0 * (0.5f32).sqrt() / 3.0).abs() < 1e-5,
                "gate must stay open, got {mono}"
            );
        }
    }

    #[test]
    fn disabled_channel_with_volume_is_gated_open() {
        // All mixer inputs disabled (R7 = 0x3F): the AND gate sees 1 on
        // both legs, so a fixed volume leaks through - hardware behaviour.
        let mut chip = PsgChip::with_clocks(2_000_000, 48_000);
        chip.write_register(8, 0x0F);
        let (left, _) = chip.render_frame();
        assert!(left > 0.0);
    }

    #[test]
    fn zero_volume_is_silent() {
        let mut chip = PsgChip::with_clocks(2_000_000, 48_000);
        for _ in 0..32 {
            let (left, right) = chip.render_frame();
            assert_eq!(left, 0.0);
            assert_eq!(right, 0.0);
        }
    }

    #[test]
    fn drum_override_bypasses_the_gate() {
        let mut chip = PsgChip::with_clocks(2_000_000, 48_000);
        chip.set_drum_override(1, Some(0.85));
        let (left, right) = chip.render_frame();
        let expected = 0.85 * (0.5f32).sqrt() / 3.0;
        assert!((left - expected).abs() < 1e-6);
        assert!((right - expected).abs() < 1e-6);

        chip.set_drum_override(1, None);
        let (left, _) = chip.render_frame();
        assert_eq!(left, 0.0);
    }

    #[test]
    fn pan_routes_output_to_one_side() {
        let mut chip = tone_a_chip();
        chip.set_channel_pan(0, -1.0);
        let (left, right) = chip.render_frame();
        assert!(left > 0.0);
        assert!(right.abs() < 1e-6);
    }

    #[test]
    fn output_magnitude_is_bounded() {
        let mut chip = tone_a_chip();
        chip.write_register(9, 0x0F);
        chip.write_register(10, 0x0F);
        chip.write_register(7, 0x38); // all tones on
        for _ in 0..512 {
            let (left, right) = chip.render_frame();
            assert!(left.abs() <= 1.0);
            assert!(right.abs() <= 1.0);
        }
    }

    #[test]
    fn envelope_volume_follows_envelope_level() {
        let mut chip = PsgChip::with_clocks(2_000_000, 48_000);
        chip.write_register(8, 0x10); // envelope mode
        chip.write_register(11, 0x01); // envelope period 1
        chip.write_register(13, 0x0D); // /¯¯¯ attack then hold max
        // Run long enough for the envelope to reach and hold the maximum.
        let mut left = vec![0.0; 2048];
        let mut right = vec![0.0; 2048];
        chip.generate_into(&mut left, &mut right);
        let tail = left[1024..].iter().copied().fold(0.0f32, f32::max);
        let expected = VOLUME_TABLE[31] * (0.5f32).sqrt() / 3.0;
        assert!((tail - expected).abs() < 1e-5);
    }

    #[test]
    fn levels_report_channel_magnitudes() {
        let mut chip = tone_a_chip();
        let _ = chip.render_frame();
        let levels = chip.channel_levels();
        assert!(levels[0] > 0.0);
        assert_eq!(levels[1], 0.0);
        assert_eq!(levels[2], 0.0);
    }
}
