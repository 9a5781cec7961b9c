//! In-memory model of a parsed YM file.

use std::sync::Arc;

use ayplay_common::SongInfo;

/// Attribute bit 0: frame data is stored register-major (interleaved).
pub const ATTR_INTERLEAVED: u32 = 1;

/// Attribute bit 2: DigiDrum samples are packed as 4-bit nibbles.
pub const ATTR_DRUM_4BIT: u32 = 4;

/// YM file format version, detected from the 4-byte magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YmFormat {
    /// `"YM2!"` - early Mad Max dump, 14 interleaved registers.
    Ym2,
    /// `"YM3!"` - standard register dump, 14 interleaved registers.
    Ym3,
    /// `"YM3b"` - YM3 with a trailing big-endian loop frame.
    Ym3b,
    /// `"YM5!"` - full header, metadata, digidrums, SID/DigiDrum effects.
    Ym5,
    /// `"YM6!"` - YM5 plus the extended two-slot effect encoding.
    Ym6,
}

impl YmFormat {
    /// Short display name ("YM3", "YM6", ...).
    pub fn name(&self) -> &'static str {
        match self {
            YmFormat::Ym2 => "YM2",
            YmFormat::Ym3 => "YM3",
            YmFormat::Ym3b => "YM3b",
            YmFormat::Ym5 => "YM5",
            YmFormat::Ym6 => "YM6",
        }
    }

    /// File magic for this version.
    pub fn magic(&self) -> &'static [u8; 4] {
        match self {
            YmFormat::Ym2 => b"YM2!",
            YmFormat::Ym3 => b"YM3!",
            YmFormat::Ym3b => b"YM3b",
            YmFormat::Ym5 => b"YM5!",
            YmFormat::Ym6 => b"YM6!",
        }
    }

    /// Whether frames carry the two effect slots in R14/R15.
    pub fn has_effects(&self) -> bool {
        matches!(self, YmFormat::Ym5 | YmFormat::Ym6)
    }
}

/// A fully decoded YM song: header fields, metadata, DigiDrum bank and the
/// register frame stream (always widened to 16 bytes per frame).
#[derive(Debug, Clone)]
pub struct YmSong {
    /// Detected format version.
    pub format: YmFormat,
    /// Raw attribute bitfield (4-bit drum flag already resolved).
    pub attributes: u32,
    /// PSG master clock in Hz.
    pub master_clock: u32,
    /// Replay (VBL) rate in Hz.
    pub frame_rate: u16,
    /// Frame index playback loops back to.
    pub loop_frame: u32,
    /// Song title.
    pub song_name: String,
    /// Composer name.
    pub author: String,
    /// Free-form comment.
    pub comment: String,
    /// DigiDrum sample bank, 8-bit unsigned PCM.
    pub digidrums: Vec<Arc<[u8]>>,
    /// Register frames; R14/R15 are zero for formats without effects.
    pub frames: Vec<[u8; 16]>,
}

impl YmSong {
    /// Number of frames in the song.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Format-independent metadata for the player surface.
    pub fn info(&self) -> SongInfo {
        SongInfo {
            title: self.song_name.clone(),
            author: self.author.clone(),
            comment: self.comment.clone(),
            format: self.format.name().to_string(),
            frame_count: self.frames.len() as u32,
            frame_rate: u32::from(self.frame_rate),
            loop_frame: self.loop_frame,
        }
    }
}
