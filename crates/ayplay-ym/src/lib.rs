//! YM file replayer for the AY/YM2149 PSG.
//!
//! Parses and plays the Atari ST `YM` register-dump formats:
//!
//! - **YM2!/YM3!**: headerless interleaved 14-register frames at 2 MHz / 50 Hz
//! - **YM3b**: YM3 with a trailing 32-bit loop frame
//! - **YM5!/YM6!**: full header (clocks, loop, attributes), DigiDrum sample
//!   bank, metadata strings, and per-frame special effects (SID voice,
//!   Sinus SID, DigiDrum, Sync Buzzer) driven by MFP timer values
//!
//! The [`YmPlayer`] applies one 16-byte register frame per VBL frame to a
//! [`PsgChip`](ayplay_core::PsgChip), runs the effect engines per audio
//! sample, and produces stereo float output through the common
//! [`ChiptunePlayer`](ayplay_common::ChiptunePlayer) interface.

#![warn(missing_docs)]

mod error;
pub mod effects;
mod format;
pub mod parser;
mod player;
pub mod serializer;

pub use error::{Result, YmError};
pub use format::{ATTR_DRUM_4BIT, ATTR_INTERLEAVED, YmFormat, YmSong};
pub use player::YmPlayer;
