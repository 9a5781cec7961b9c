//! Per-channel tracker state.
//!
//! Each PSG channel runs its own pattern interpreter over one bytecode
//! stream and produces tone/volume/mixer values every tick. The row
//! encoding places effect parameters after the row terminator, in reverse
//! order of the effects that appeared inside the row, so effect codes are
//! stacked during the row and their parameters popped afterwards.

use crate::format::Pt3Module;
use crate::tables::NOTE_COUNT;

/// Global state a row or tick can touch besides its own channel.
#[derive(Debug, Clone)]
pub(crate) struct Globals {
    pub noise_base: u8,
    pub env_base_hi: u8,
    pub env_base_lo: u8,
    pub cur_env_slide: i32,
    pub env_slide_step: i32,
    pub env_delay: i32,
    pub cur_env_delay: i32,
    /// Pending envelope shape; 0xFF means no write this tick.
    pub new_envelope_shape: u8,
    /// Ticks per row.
    pub delay: u8,
}

impl Globals {
    pub fn new(delay: u8) -> Self {
        Self {
            noise_base: 0,
            env_base_hi: 0,
            env_base_lo: 0,
            cur_env_slide: 0,
            env_slide_step: 0,
            env_delay: 0,
            cur_env_delay: 0,
            new_envelope_shape: 0xFF,
            delay: delay.max(1),
        }
    }

    /// Advance the envelope slide countdown, once per tick.
    pub fn advance_envelope_slide(&mut self) {
        if self.cur_env_delay > 0 {
            self.cur_env_delay -= 1;
            if self.cur_env_delay == 0 {
                self.cur_env_delay = self.env_delay;
                self.cur_env_slide += self.env_slide_step;
            }
        }
    }
}

/// Register contribution of one channel for one tick.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ChannelTick {
    pub tone: u16,
    pub volume: u8,
    pub tone_off: bool,
    pub noise_off: bool,
    /// Envelope period contribution (summed across channels).
    pub add_to_env: i32,
    /// Noise period contribution (last unmasked channel wins).
    pub add_to_noise: Option<i32>,
}

impl ChannelTick {
    fn muted() -> Self {
        Self {
            tone_off: true,
            noise_off: true,
            ..Self::default()
        }
    }
}

/// Complete state of one tracker channel.
#[derive(Debug, Clone)]
pub(crate) struct ChannelState {
    pub cursor: usize,

    pub enabled: bool,
    pub envelope_enabled: bool,
    pub simple_gliss: bool,

    pub note: u8,
    pub slide_to_note: u8,
    pub volume: u8,

    pub sample_index: usize,
    pub ornament_index: usize,
    pub position_in_sample: usize,
    pub position_in_ornament: usize,

    pub number_of_notes_to_skip: i32,
    pub note_skip_counter: i32,

    pub ton_accumulator: i32,
    pub current_ton_sliding: i32,
    pub ton_slide_step: i32,
    pub ton_slide_delay: i32,
    pub ton_slide_count: i32,
    pub ton_delta: i32,

    pub current_amplitude_sliding: i32,
    pub current_noise_sliding: i32,
    pub current_envelope_sliding: i32,

    pub current_on_off: i32,
    pub on_off_delay: i32,
    pub off_on_delay: i32,
}

impl ChannelState {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            enabled: false,
            envelope_enabled: false,
            simple_gliss: false,
            note: 0,
            slide_to_note: 0,
            volume: 15,
            sample_index: 1,
            ornament_index: 0,
            position_in_sample: 0,
            position_in_ornament: 0,
            number_of_notes_to_skip: 0,
            note_skip_counter: 0,
            ton_accumulator: 0,
            current_ton_sliding: 0,
            ton_slide_step: 0,
            ton_slide_delay: 0,
            ton_slide_count: 0,
            ton_delta: 0,
            current_amplitude_sliding: 0,
            current_noise_sliding: 0,
            current_envelope_sliding: 0,
            current_on_off: 0,
            on_off_delay: 0,
            off_on_delay: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Rewind the pattern cursor for a new song position.
    pub fn enter_position(&mut self) {
        self.cursor = 0;
        self.note_skip_counter = 0;
    }

    fn clear_note_state(&mut self) {
        self.position_in_sample = 0;
        self.position_in_ornament = 0;
        self.current_amplitude_sliding = 0;
        self.current_noise_sliding = 0;
        self.current_envelope_sliding = 0;
        self.ton_slide_count = 0;
        self.current_ton_sliding = 0;
        self.ton_accumulator = 0;
        self.current_on_off = 0;
    }

    /// Next byte and cursor advance; reads past the end yield zero.
    fn take(&mut self, stream: &[u8]) -> u8 {
        let byte = stream.get(self.cursor).copied().unwrap_or(0);
        if self.cursor < stream.len() {
            self.cursor += 1;
        }
        byte
    }

    fn peek(&self, stream: &[u8]) -> u8 {
        stream.get(self.cursor).copied().unwrap_or(0)
    }

    /// Whether the interpreter sits on the end-of-track marker.
    pub fn at_end_of_track(&self, stream: &[u8]) -> bool {
        self.peek(stream) == 0
    }

    /// Interpret one row of pattern bytecode.
    ///
    /// Consumes bytes up to a row terminator (a note, a note-off, 0xD0 or
    /// end-of-track), then the post-row parameter bytes of the effects
    /// recorded during the row, in LIFO order.
    pub fn interpret_row(
        &mut self,
        stream: &[u8],
        globals: &mut Globals,
        note_table: &[u16; NOTE_COUNT],
        version: u8,
    ) {
        let prev_note = self.note;
        let prev_sliding = self.current_ton_sliding;
        let mut effects: Vec<u8> = Vec::new();

        loop {
            // End-of-track terminates the row without consuming, so the
            // outer loop keeps seeing the marker.
            if self.at_end_of_track(stream) {
                break;
            }
            let byte = self.take(stream);
            match byte {
                0x01..=0x09 => effects.push(byte),
                0x10 => {
                    self.envelope_enabled = false;
                    let sample = usize::from(self.take(stream)) / 2;
                    self.sample_index = sample;
                }
                0x11..=0x1F => {
                    self.set_envelope(globals, byte - 0x10, stream);
                    let sample = usize::from(self.take(stream)) / 2;
                    self.sample_index = sample;
                }
                0x20..=0x3F => globals.noise_base = byte - 0x20,
                0x40..=0x4F => {
                    self.ornament_index = usize::from(byte - 0x40);
                    self.position_in_ornament = 0;
                }
                0x50..=0xAF => {
                    self.note = byte - 0x50;
                    self.clear_note_state();
                    self.enabled = true;
                    break;
                }
                0xB0 => {
                    self.envelope_enabled = false;
                    self.position_in_ornament = 0;
                }
                0xB1 => {
                    self.number_of_notes_to_skip = i32::from(self.take(stream));
                }
                0xB2..=0xBF => self.set_envelope(globals, byte - 0xB1, stream),
                0xC0 => {
                    self.clear_note_state();
                    self.enabled = false;
                    break;
                }
                0xC1..=0xCF => self.volume = byte - 0xC0,
                0xD0 => break,
                0xD1..=0xEF => self.sample_index = usize::from(byte - 0xD0),
                0xF0..=0xFF => {
                    self.ornament_index = usize::from(byte - 0xF0);
                    self.position_in_ornament = 0;
                    let sample = usize::from(self.take(stream)) / 2;
                    self.sample_index = sample;
                    self.envelope_enabled = false;
                }
                // 0x0A-0x0F are unused; skip them to stay tolerant of
                // broken files.
                _ => {}
            }
        }

        while let Some(effect) = effects.pop() {
            self.read_effect_params(
                effect,
                stream,
                globals,
                note_table,
                version,
                prev_note,
                prev_sliding,
            );
        }

        self.note_skip_counter = self.number_of_notes_to_skip;
    }

    fn set_envelope(&mut self, globals: &mut Globals, shape: u8, stream: &[u8]) {
        globals.new_envelope_shape = shape & 0x0F;
        globals.env_base_hi = self.take(stream);
        globals.env_base_lo = self.take(stream);
        globals.cur_env_slide = 0;
        globals.cur_env_delay = 0;
        self.envelope_enabled = true;
        self.position_in_ornament = 0;
    }

    fn read_i16(&mut self, stream: &[u8]) -> i16 {
        let lo = self.take(stream);
        let hi = self.take(stream);
        i16::from_le_bytes([lo, hi])
    }

    #[allow(clippy::too_many_arguments)]
    fn read_effect_params(
        &mut self,
        effect: u8,
        stream: &[u8],
        globals: &mut Globals,
        note_table: &[u16; NOTE_COUNT],
        version: u8,
        prev_note: u8,
        prev_sliding: i32,
    ) {
        match effect {
            // Simple glissando: slide the period forever.
            0x01 => {
                self.simple_gliss = true;
                self.ton_slide_delay = i32::from(self.take(stream));
                self.ton_slide_count = self.ton_slide_delay;
                self.ton_slide_step = i32::from(self.read_i16(stream));
            }
            // Portamento: slide towards the row's note from the previous
            // one; the note byte already executed, so restore it.
            0x02 => {
                self.simple_gliss = false;
                self.ton_slide_delay = i32::from(self.take(stream));
                self.ton_slide_count = self.ton_slide_delay;
                self.take(stream); // unused precomputed delta
                self.take(stream);
                let mut step = i32::from(self.read_i16(stream)).abs();
                self.ton_delta = i32::from(note_table[usize::from(self.note.min(95))])
                    - i32::from(note_table[usize::from(prev_note.min(95))]);
                self.slide_to_note = self.note;
                self.note = prev_note;
                // PT 3.6 resumes an interrupted slide where it stood;
                // earlier trackers restart from zero.
                if version >= 6 {
                    self.current_ton_sliding = prev_sliding;
                }
                if self.ton_delta - self.current_ton_sliding < 0 {
                    step = -step;
                }
                self.ton_slide_step = step;
            }
            0x03 => self.position_in_sample = usize::from(self.take(stream)),
            0x04 => self.position_in_ornament = usize::from(self.take(stream)),
            // Vibrato: alternate the channel gate on a timer.
            0x05 => {
                self.on_off_delay = i32::from(self.take(stream));
                self.off_on_delay = i32::from(self.take(stream));
                self.current_on_off = self.on_off_delay;
                self.ton_slide_count = 0;
                self.current_ton_sliding = 0;
            }
            0x08 => {
                globals.env_delay = i32::from(self.take(stream));
                globals.cur_env_delay = globals.env_delay;
                globals.env_slide_step = i32::from(self.read_i16(stream));
            }
            0x09 => globals.delay = self.take(stream).max(1),
            // 0x06/0x07 carry no parameters in any known file.
            _ => {}
        }
    }

    /// Produce this channel's register contribution for one tick and
    /// advance the per-tick automation state.
    pub fn generate(
        &mut self,
        module: &Pt3Module,
        note_table: &[u16; NOTE_COUNT],
        volume_table: &[[u8; 16]; 16],
    ) -> ChannelTick {
        self.advance_on_off();
        if !self.enabled {
            return ChannelTick::muted();
        }

        // A reference to a missing sample or ornament mutes the channel
        // for this tick; it never aborts playback.
        let Some(sample) = module
            .samples
            .get(self.sample_index)
            .and_then(|slot| slot.as_ref())
        else {
            return ChannelTick::muted();
        };
        let Some(ornament) = module
            .ornaments
            .get(self.ornament_index)
            .and_then(|slot| slot.as_ref())
        else {
            return ChannelTick::muted();
        };

        let frame = sample.frames[self.position_in_sample.min(sample.frames.len() - 1)];

        let mut tone = i32::from(frame.tone_offset) + self.ton_accumulator;
        if frame.accumulate_tone {
            self.ton_accumulator = tone;
        }
        let ornament_offset = ornament
            .offsets
            .get(self.position_in_ornament.min(ornament.offsets.len() - 1))
            .copied()
            .unwrap_or(0);
        let note = (i32::from(self.note) + i32::from(ornament_offset)).clamp(0, 95) as usize;
        tone = (tone + self.current_ton_sliding + i32::from(note_table[note])) & 0xFFF;

        self.advance_tone_slide();

        let mut amplitude = i32::from(frame.amplitude);
        if frame.amplitude_slide_enabled {
            self.current_amplitude_sliding =
                (self.current_amplitude_sliding + i32::from(frame.amplitude_slide)).clamp(-15, 15);
        }
        amplitude = (amplitude + self.current_amplitude_sliding).clamp(0, 15);
        amplitude = i32::from(volume_table[usize::from(self.volume)][amplitude as usize]);

        let mut volume = amplitude as u8;
        if self.envelope_enabled && !frame.envelope_mask {
            volume |= 0x10;
        }

        let mut add_to_env = 0;
        let mut add_to_noise = None;
        if frame.noise_mask {
            let value = i32::from(frame.envelope_offset) + self.current_envelope_sliding;
            if frame.accumulate_noise {
                self.current_envelope_sliding = value;
            }
            add_to_env = value;
        } else {
            let value = i32::from(frame.noise_offset) + self.current_noise_sliding;
            if frame.accumulate_noise {
                self.current_noise_sliding = value;
            }
            add_to_noise = Some(value);
        }

        self.position_in_sample += 1;
        if self.position_in_sample >= sample.frames.len() {
            self.position_in_sample = sample.loop_position;
        }
        self.position_in_ornament += 1;
        if self.position_in_ornament >= ornament.offsets.len() {
            self.position_in_ornament = ornament.loop_position;
        }

        ChannelTick {
            tone: tone as u16,
            volume,
            tone_off: frame.tone_mask,
            noise_off: frame.noise_mask,
            add_to_env,
            add_to_noise,
        }
    }

    fn advance_tone_slide(&mut self) {
        if self.ton_slide_count <= 0 {
            return;
        }
        self.ton_slide_count -= 1;
        if self.ton_slide_count == 0 {
            self.current_ton_sliding += self.ton_slide_step;
            self.ton_slide_count = self.ton_slide_delay;
            if !self.simple_gliss {
                let reached = if self.ton_slide_step < 0 {
                    self.current_ton_sliding <= self.ton_delta
                } else {
                    self.current_ton_sliding >= self.ton_delta
                };
                if reached {
                    // Snap to the target and stop sliding.
                    self.note = self.slide_to_note;
                    self.ton_slide_count = 0;
                    self.current_ton_sliding = 0;
                }
            }
        }
    }

    fn advance_on_off(&mut self) {
        if self.current_on_off <= 0 {
            return;
        }
        self.current_on_off -= 1;
        if self.current_on_off == 0 {
            self.enabled = !self.enabled;
            self.current_on_off = if self.enabled {
                self.on_off_delay.max(1)
            } else {
                self.off_on_delay.max(1)
            };
        }
    }
}
