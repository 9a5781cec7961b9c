//! YM5/YM6 special effects.
//!
//! These are not hardware features: they are playback techniques the Atari
//! ST demo scene drove from MFP timer interrupts, re-encoded per frame in
//! the upper bits of otherwise unused register nibbles. The
//! [`decoder`] turns frame registers into [`EffectCommand`]s, the
//! [`manager`] runs the per-sample engines against the PSG chip.

pub mod decoder;
pub mod manager;

pub use decoder::{EffectCommand, MFP_CLOCK, decode_frame_ym5, decode_frame_ym6};
pub use manager::EffectsManager;
