//! ProTracker 3 replayer for the AY/YM2149 PSG.
//!
//! Parses PT3 modules (including TurboSound dual-chip files, which are two
//! concatenated modules) and interprets the tracker bytecode into per-tick
//! PSG register values: samples, ornaments, glissando, portamento, vibrato,
//! envelope and noise automation.
//!
//! The [`Pt3Player`] runs one pattern interpreter per module, applies the
//! produced register frames to one [`PsgChip`](ayplay_core::PsgChip) per
//! module, and renders stereo audio through the common
//! [`ChiptunePlayer`](ayplay_common::ChiptunePlayer) interface.

#![warn(missing_docs)]

mod channel;
mod error;
mod format;
pub mod parser;
mod player;
pub mod tables;

pub use error::{Pt3Error, Result};
pub use format::{Pt3File, Pt3Module, Pt3Ornament, Pt3Pattern, Pt3Sample, SampleFrame};
pub use player::Pt3Player;
