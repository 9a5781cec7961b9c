//! AY-3-8910 / YM2149 PSG emulation core.
//!
//! A bit-accurate emulation of the General Instrument AY-3-8910 and Yamaha
//! YM2149 Programmable Sound Generator as used in the Atari ST and
//! ZX Spectrum. The internal state machines run at the chip's internal clock
//! (master clock / 8) while output is produced one stereo float frame per
//! audio sample.
//!
//! # Features
//! - 3 tone channels with 12-bit period control
//! - 17-bit LFSR noise generator (half-rate, hardware feedback taps)
//! - Hardware envelope generator (16 register shapes, 10 unique waveforms)
//! - AND-gate mixer with OR-accumulated tone/noise across internal ticks,
//!   so periods above Nyquist degrade to a sustained gate instead of aliasing
//! - Per-channel equal-power panning and DigiDrum sample override
//! - Multi-chip bank for TurboSound configurations
//!
//! # Quick start
//! ```
//! use ayplay_core::PsgChip;
//!
//! let mut chip = PsgChip::new();
//! chip.write_register(0, 0x1C); // Tone A period low
//! chip.write_register(1, 0x01); // Tone A period high
//! chip.write_register(8, 0x0F); // Volume A
//! chip.write_register(7, 0x3E); // Mixer: tone A on
//! let (left, right) = chip.render_frame();
//! assert!(left.abs() <= 1.0 && right.abs() <= 1.0);
//! ```

#![warn(missing_docs)]

mod bank;
mod chip;
mod generators;
mod mixer;
pub mod tables;

pub use bank::PsgBank;
pub use chip::{NUM_REGISTERS, PsgChip};
pub use generators::{EnvelopeGenerator, NUM_CHANNELS, NoiseGenerator, ToneGenerator};
pub use mixer::{MixerState, Panner};
