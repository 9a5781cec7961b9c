//! Common traits and types shared by the AY/YM2149 chiptune replayers.
//!
//! This crate provides the abstractions used across both replayer
//! implementations (YM register streams and PT3 tracker modules):
//!
//! - [`ChiptunePlayer`] - unified, object-safe playback interface
//! - [`SongInfo`] - format-independent song metadata
//! - [`ChannelLevels`] - lock-free per-channel level observation buffer
//!
//! # Example
//!
//! ```ignore
//! use ayplay_common::{ChiptunePlayer, PlaybackState};
//!
//! fn play_any(player: &mut dyn ChiptunePlayer) {
//!     player.play();
//!     let mut left = vec![0.0; 1024];
//!     let mut right = vec![0.0; 1024];
//!     while player.state() == PlaybackState::Playing {
//!         player.render(&mut left, &mut right);
//!         // ... push to the audio device
//!     }
//! }
//! ```

#![warn(missing_docs)]

mod levels;
mod metadata;
mod player;

pub use levels::ChannelLevels;
pub use metadata::SongInfo;
pub use player::{ChiptunePlayer, PlaybackState, PlayerEvent, PlayerObserver};

// ============================================================================
// Common Constants
// ============================================================================

/// Standard audio sample rate (44.1 kHz).
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// PAL frame rate (50 Hz) - Atari ST and ZX Spectrum both replay at VBL rate.
pub const FRAME_RATE_PAL: u32 = 50;

/// NTSC frame rate (60 Hz) - used by some converted dumps.
pub const FRAME_RATE_NTSC: u32 = 60;

/// Atari ST master clock for the YM2149 (2 MHz).
pub const ATARI_ST_CLOCK: u32 = 2_000_000;

/// ZX Spectrum 128K master clock for the AY-3-8910 (~1.77 MHz).
pub const ZX_SPECTRUM_CLOCK: u32 = 1_773_400;

/// Number of audio channels per PSG chip.
pub const CHANNELS_PER_PSG: usize = 3;

/// Upper bound on song length in frames, shared by the format parsers and
/// the PT3 duration pre-computation. Anything above this is a corrupt file.
pub const MAX_SONG_FRAMES: u32 = 100_000;
