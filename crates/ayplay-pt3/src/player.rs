//! PT3 tracker player.
//!
//! A two-level state machine per module: the outer loop advances rows at
//! the song delay, the pattern interpreter consumes bytecode per row, and
//! register generation runs every tick. TurboSound files run two tracker
//! units against a two-chip bank.

use std::sync::Arc;

use ayplay_common::{
    ChiptunePlayer, DEFAULT_SAMPLE_RATE, FRAME_RATE_PAL, MAX_SONG_FRAMES, PlaybackState,
    PlayerEvent, PlayerObserver, SongInfo, ZX_SPECTRUM_CLOCK,
};
use ayplay_core::PsgBank;

use crate::channel::{ChannelState, Globals};
use crate::error::Result;
use crate::format::{Pt3File, Pt3Module};
use crate::parser;
use crate::tables::{self, NOTE_COUNT};

/// Driver state for one module (one PSG chip's worth of channels).
#[derive(Debug, Clone)]
struct TrackerUnit {
    module: Arc<Pt3Module>,
    note_table: &'static [u16; NOTE_COUNT],
    volume_table: &'static [[u8; 16]; 16],
    channels: [ChannelState; 3],
    globals: Globals,
    current_position: usize,
    delay_counter: u8,
    loops: u32,
}

impl TrackerUnit {
    fn new(module: Arc<Pt3Module>) -> Self {
        let note_table = tables::tone_table(module.tone_table, module.version);
        let volume_table = tables::volume_table(module.version);
        let delay = module.initial_delay;
        Self {
            module,
            note_table,
            volume_table,
            channels: [ChannelState::new(), ChannelState::new(), ChannelState::new()],
            globals: Globals::new(delay),
            current_position: 0,
            delay_counter: 1,
            loops: 0,
        }
    }

    fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
        self.globals = Globals::new(self.module.initial_delay);
        self.current_position = 0;
        self.delay_counter = 1;
        self.loops = 0;
    }

    fn stream(module: &Pt3Module, position: usize, channel: usize) -> &[u8] {
        module
            .pattern_at(position)
            .map(|pattern| pattern.streams[channel].as_slice())
            .unwrap_or(&[])
    }

    /// Row bookkeeping: runs when the delay counter expires.
    fn process_rows(&mut self) {
        let module = self.module.clone();

        for channel in &mut self.channels {
            channel.note_skip_counter -= 1;
        }

        // A channel that is both due and parked on the end-of-track marker
        // pushes the whole module to the next song position.
        let position_done = (0..3).any(|index| {
            self.channels[index].note_skip_counter <= 0
                && self.channels[index]
                    .at_end_of_track(Self::stream(&module, self.current_position, index))
        });
        if position_done {
            self.current_position += 1;
            if self.current_position >= module.positions.len() {
                self.current_position = module.loop_position;
                self.loops += 1;
            }
            for channel in &mut self.channels {
                channel.enter_position();
            }
        }

        for (index, channel) in self.channels.iter_mut().enumerate() {
            if channel.note_skip_counter <= 0 {
                channel.interpret_row(
                    Self::stream(&module, self.current_position, index),
                    &mut self.globals,
                    self.note_table,
                    module.version,
                );
            }
        }

        self.delay_counter = self.globals.delay.max(1);
    }

    /// Advance one tick and emit the register image for this module's chip.
    /// R13 is 0xFF unless a new envelope shape is pending.
    fn tick(&mut self) -> [u8; 16] {
        self.delay_counter -= 1;
        if self.delay_counter == 0 {
            self.process_rows();
        }

        let mut frame = [0u8; 16];
        frame[13] = 0xFF;
        let mut mixer = 0u8;
        let mut add_to_env = 0i32;
        let mut add_to_noise = 0i32;

        for index in 0..3 {
            let tick =
                self.channels[index].generate(&self.module, self.note_table, self.volume_table);
            frame[index * 2] = (tick.tone & 0xFF) as u8;
            frame[index * 2 + 1] = (tick.tone >> 8) as u8;
            frame[8 + index] = tick.volume;
            if tick.tone_off {
                mixer |= 1 << index;
            }
            if tick.noise_off {
                mixer |= 1 << (index + 3);
            }
            add_to_env += tick.add_to_env;
            if let Some(noise) = tick.add_to_noise {
                add_to_noise = noise;
            }
        }

        frame[6] = ((i32::from(self.globals.noise_base) + add_to_noise) & 0x1F) as u8;
        frame[7] = mixer;

        let env_base =
            (i32::from(self.globals.env_base_hi) << 8) | i32::from(self.globals.env_base_lo);
        let env_period = (env_base + self.globals.cur_env_slide + add_to_env).clamp(0, 0xFFFF);
        frame[11] = (env_period & 0xFF) as u8;
        frame[12] = (env_period >> 8) as u8;

        if self.globals.new_envelope_shape != 0xFF {
            frame[13] = self.globals.new_envelope_shape;
            self.globals.new_envelope_shape = 0xFF;
        }

        self.globals.advance_envelope_slide();
        frame
    }
}

/// ProTracker 3 player, driving one PSG chip per module.
pub struct Pt3Player {
    bank: PsgBank,
    units: Vec<TrackerUnit>,
    info: SongInfo,
    state: PlaybackState,
    sample_rate: u32,
    samples_per_frame: u32,
    samples_into_frame: u32,
    frame_applied: bool,
    current_frame: u32,
    total_frames: u32,
    loop_frame: u32,
    master_volume: f32,
    loop_enabled: bool,
    observer: Option<PlayerObserver>,
}

impl Pt3Player {
    /// Parse a PT3 file and build a player at the default sample rate.
    pub fn load(data: &[u8]) -> Result<Self> {
        Self::load_with_rate(data, DEFAULT_SAMPLE_RATE)
    }

    /// Parse a PT3 file and build a player at an explicit sample rate.
    pub fn load_with_rate(data: &[u8], sample_rate: u32) -> Result<Self> {
        Ok(Self::from_file(parser::parse(data)?, sample_rate))
    }

    /// Build a player from a parsed file.
    pub fn from_file(file: Pt3File, sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        let units: Vec<TrackerUnit> = file
            .modules
            .into_iter()
            .map(|module| TrackerUnit::new(Arc::new(module)))
            .collect();
        let bank = PsgBank::new(units.len(), ZX_SPECTRUM_CLOCK, sample_rate);

        let (total_frames, loop_frame) = measure_song(&units[0]);
        let mut info = units[0].module.info();
        info.frame_count = total_frames;
        info.loop_frame = loop_frame;
        if units.len() > 1 {
            info.format.push_str(" TurboSound");
        }

        Self {
            bank,
            units,
            info,
            state: PlaybackState::Stopped,
            sample_rate,
            samples_per_frame: (f64::from(sample_rate) / f64::from(FRAME_RATE_PAL)).round() as u32,
            samples_into_frame: 0,
            frame_applied: false,
            current_frame: 0,
            total_frames,
            loop_frame,
            master_volume: 1.0,
            loop_enabled: true,
            observer: None,
        }
    }

    /// Whether this file drives two chips.
    pub fn is_turbo_sound(&self) -> bool {
        self.units.len() > 1
    }

    /// Keep playing past the loop point (default) or stop there.
    pub fn set_loop_enabled(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    /// The chip bank, for diagnostics and tests.
    pub fn bank(&self) -> &PsgBank {
        &self.bank
    }

    fn emit(&mut self, event: PlayerEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(event);
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.emit(PlayerEvent::StateChanged(state));
        }
    }

    /// Run one driver tick on every unit and apply the register frames.
    fn advance_frame(&mut self) {
        let looped_before: u32 = self.units[0].loops;
        for (index, unit) in self.units.iter_mut().enumerate() {
            let frame = unit.tick();
            let chip = self.bank.chip_mut(index);
            for (register, &value) in frame.iter().enumerate().take(13) {
                chip.write_register(register as u8, value);
            }
            if frame[13] != 0xFF {
                chip.write_register(13, frame[13]);
            }
        }

        if self.units[0].loops > looped_before {
            self.current_frame = self.loop_frame;
            if !self.loop_enabled {
                self.set_state(PlaybackState::Stopped);
                return;
            }
        } else {
            self.current_frame += 1;
        }
        let current = self.current_frame;
        let total = self.total_frames;
        self.emit(PlayerEvent::FrameChanged { current, total });
    }

    fn reset_driver(&mut self) {
        for unit in &mut self.units {
            unit.reset();
        }
        self.bank.reset();
        self.samples_into_frame = 0;
        self.frame_applied = false;
        self.current_frame = 0;
    }
}

/// Pre-simulate a unit to count the frames up to the first wrap-around,
/// and locate the frame index the loop position lands on.
fn measure_song(unit: &TrackerUnit) -> (u32, u32) {
    let loop_position = unit.module.loop_position;
    let mut probe = unit.clone();
    let mut frames = 0u32;
    let mut loop_frame = 0u32;
    let mut loop_frame_found = loop_position == 0;
    let mut previous_position = usize::MAX;
    while frames < MAX_SONG_FRAMES {
        let loops_before = probe.loops;
        let _ = probe.tick();
        if !loop_frame_found
            && probe.current_position == loop_position
            && previous_position != loop_position
        {
            loop_frame = frames;
            loop_frame_found = true;
        }
        previous_position = probe.current_position;
        if probe.loops > loops_before {
            break;
        }
        frames += 1;
    }
    (frames, loop_frame)
}

impl ChiptunePlayer for Pt3Player {
    fn play(&mut self) {
        self.set_state(PlaybackState::Playing);
    }

    fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            for index in 0..self.units.len() {
                for register in 8..=10 {
                    self.bank.write_register(index, register, 0);
                }
            }
            self.set_state(PlaybackState::Paused);
        }
    }

    fn stop(&mut self) {
        self.reset_driver();
        self.set_state(PlaybackState::Stopped);
    }

    fn state(&self) -> PlaybackState {
        self.state
    }

    fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        if self.state != PlaybackState::Playing {
            left.fill(0.0);
            right.fill(0.0);
            return;
        }
        for index in 0..left.len() {
            if !self.frame_applied {
                // First tick after play/stop: apply frame 0's registers
                // before any audio is produced.
                self.advance_frame_at_start();
            }
            if self.samples_into_frame >= self.samples_per_frame {
                self.samples_into_frame = 0;
                self.advance_frame();
                if self.state != PlaybackState::Playing {
                    left[index..].fill(0.0);
                    right[index..].fill(0.0);
                    return;
                }
            }
            self.samples_into_frame += 1;
            let (sl, sr) = self.bank.render_frame();
            left[index] = sl * self.master_volume;
            right[index] = sr * self.master_volume;
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frame_rate(&self) -> u32 {
        FRAME_RATE_PAL
    }

    fn current_frame(&self) -> u32 {
        self.current_frame
    }

    fn frame_count(&self) -> u32 {
        self.total_frames
    }

    fn loops_completed(&self) -> u32 {
        self.units[0].loops
    }

    fn seek_frame(&mut self, frame: u32) {
        let target = frame.min(self.total_frames.saturating_sub(1));
        self.reset_driver();
        // Fast-forward the driver without producing audio.
        for _ in 0..target {
            for (index, unit) in self.units.iter_mut().enumerate() {
                let image = unit.tick();
                let chip = self.bank.chip_mut(index);
                for (register, &value) in image.iter().enumerate().take(13) {
                    chip.write_register(register as u8, value);
                }
                if image[13] != 0xFF {
                    chip.write_register(13, image[13]);
                }
            }
        }
        self.current_frame = target;
        let total = self.total_frames;
        self.emit(PlayerEvent::FrameChanged {
            current: target,
            total,
        });
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    fn set_channel_pan(&mut self, channel: usize, pan: f32) {
        self.bank.set_channel_pan(channel, pan);
    }

    fn channel_levels(&self) -> [f32; 3] {
        self.bank.channel_levels()
    }

    fn set_observer(&mut self, observer: PlayerObserver) {
        self.observer = Some(observer);
    }

    fn info(&self) -> &SongInfo {
        &self.info
    }
}

impl Pt3Player {
    fn advance_frame_at_start(&mut self) {
        self.frame_applied = true;
        self.samples_into_frame = 0;
        for (index, unit) in self.units.iter_mut().enumerate() {
            let frame = unit.tick();
            let chip = self.bank.chip_mut(index);
            for (register, &value) in frame.iter().enumerate().take(13) {
                chip.write_register(register as u8, value);
            }
            if frame[13] != 0xFF {
                chip.write_register(13, frame[13]);
            }
        }
        let total = self.total_frames;
        self.emit(PlayerEvent::FrameChanged { current: 0, total });
    }
}
