//! In-memory model of a parsed PT3 module.
//!
//! Sample and ornament references are small indices into the fixed banks
//! (32 samples, 16 ornaments); patterns hold three independent bytecode
//! streams, one per PSG channel. Nothing here points back into the file.

use ayplay_common::SongInfo;

/// One 4-byte sample line, fully decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleFrame {
    /// Base amplitude for this line (0-15).
    pub amplitude: u8,
    /// Per-tick amplitude slide step (+1/-1) applied while this line plays.
    pub amplitude_slide: i8,
    /// Whether the amplitude slide accumulator advances on this line.
    pub amplitude_slide_enabled: bool,
    /// Signed tone period offset.
    pub tone_offset: i16,
    /// Whether the tone offset accumulates across ticks.
    pub accumulate_tone: bool,
    /// Tone disabled on this line (mixer bit).
    pub tone_mask: bool,
    /// Noise disabled on this line (mixer bit); when set, the 5-bit offset
    /// field feeds the envelope period instead of the noise period.
    pub noise_mask: bool,
    /// Envelope suppressed on this line even when the channel enables it.
    pub envelope_mask: bool,
    /// Whether the noise/envelope offset accumulates across ticks.
    pub accumulate_noise: bool,
    /// Raw 5-bit noise period offset (used when noise is unmasked).
    pub noise_offset: u8,
    /// Sign-extended 5-bit envelope period offset (used when noise is
    /// masked).
    pub envelope_offset: i8,
}

/// A loopable instrument: a sequence of sample lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pt3Sample {
    /// Line index playback loops back to.
    pub loop_position: usize,
    /// Decoded sample lines.
    pub frames: Vec<SampleFrame>,
}

/// A loopable pitch-offset automation track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pt3Ornament {
    /// Offset index playback loops back to.
    pub loop_position: usize,
    /// Signed note offsets, one per tick.
    pub offsets: Vec<i8>,
}

/// Three channel bytecode streams, each terminated by 0x00.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pt3Pattern {
    /// Channel A/B/C streams (terminator included).
    pub streams: [Vec<u8>; 3],
}

/// One parsed PT3 module.
#[derive(Debug, Clone)]
pub struct Pt3Module {
    /// Tracker minor version digit (3-6 in the wild; 6 when unreadable).
    pub version: u8,
    /// Tone table id from the header (0-3).
    pub tone_table: u8,
    /// Initial ticks per row (clamped >= 1).
    pub initial_delay: u8,
    /// Index into the position list playback loops back to.
    pub loop_position: usize,
    /// Song order: pattern indices.
    pub positions: Vec<usize>,
    /// Sample bank (index 0-31; missing entries mute the channel).
    pub samples: Vec<Option<Pt3Sample>>,
    /// Ornament bank (index 0-15).
    pub ornaments: Vec<Option<Pt3Ornament>>,
    /// Pattern bank.
    pub patterns: Vec<Pt3Pattern>,
    /// Title from the header (offset 0x1E, 32 bytes).
    pub title: String,
    /// Author from the header (offset 0x42, 32 bytes).
    pub author: String,
}

impl Pt3Module {
    /// Pattern index at a song position.
    pub fn pattern_at(&self, position: usize) -> Option<&Pt3Pattern> {
        self.positions
            .get(position)
            .and_then(|&index| self.patterns.get(index))
    }

    /// Base metadata; frame counting is filled in by the player.
    pub fn info(&self) -> SongInfo {
        SongInfo {
            title: self.title.clone(),
            author: self.author.clone(),
            comment: String::new(),
            format: format!("PT3.{}", self.version),
            frame_count: 0,
            frame_rate: ayplay_common::FRAME_RATE_PAL,
            loop_frame: 0,
        }
    }
}

/// A parsed PT3 file: one module, or two for TurboSound dumps.
#[derive(Debug, Clone)]
pub struct Pt3File {
    /// The modules in file order; TurboSound files carry two.
    pub modules: Vec<Pt3Module>,
}

impl Pt3File {
    /// Whether this is a TurboSound (dual chip) file.
    pub fn is_turbo_sound(&self) -> bool {
        self.modules.len() > 1
    }
}
