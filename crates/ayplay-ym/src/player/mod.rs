//! YM file player.
//!
//! Applies one register frame per VBL frame to the PSG chip, decodes and
//! drives the special effects, and produces stereo audio through the
//! common player interface.

mod sequencer;

pub use sequencer::{AdvanceResult, FrameSequencer};

use ayplay_common::{
    ChiptunePlayer, DEFAULT_SAMPLE_RATE, PlaybackState, PlayerEvent, PlayerObserver, SongInfo,
};
use ayplay_core::PsgChip;

use crate::effects::{EffectCommand, EffectsManager, decode_frame_ym5, decode_frame_ym6};
use crate::error::Result;
use crate::format::{YmFormat, YmSong};
use crate::parser;

/// Register-stream replayer for YM2 through YM6 files.
pub struct YmPlayer {
    chip: PsgChip,
    effects: EffectsManager,
    sequencer: FrameSequencer,
    song: YmSong,
    info: SongInfo,
    state: PlaybackState,
    sample_rate: u32,
    master_volume: f32,
    loops: u32,
    observer: Option<PlayerObserver>,
}

impl YmPlayer {
    /// Parse a YM file and build a player at the default sample rate.
    pub fn load(data: &[u8]) -> Result<Self> {
        Self::load_with_rate(data, DEFAULT_SAMPLE_RATE)
    }

    /// Parse a YM file and build a player at an explicit sample rate.
    pub fn load_with_rate(data: &[u8], sample_rate: u32) -> Result<Self> {
        let song = parser::parse(data)?;
        Ok(Self::from_song(song, sample_rate))
    }

    /// Build a player from an already parsed song.
    pub fn from_song(song: YmSong, sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        let samples_per_frame =
            (f64::from(sample_rate) / f64::from(song.frame_rate.max(1))).round() as u32;
        let info = song.info();
        Self {
            chip: PsgChip::with_clocks(song.master_clock, sample_rate),
            effects: EffectsManager::new(sample_rate),
            sequencer: FrameSequencer::new(
                song.frame_count(),
                song.loop_frame as usize,
                samples_per_frame,
            ),
            song,
            info,
            state: PlaybackState::Stopped,
            sample_rate,
            master_volume: 1.0,
            loops: 0,
            observer: None,
        }
    }

    /// The parsed song.
    pub fn song(&self) -> &YmSong {
        &self.song
    }

    /// Read access to the underlying chip, for diagnostics and tests.
    pub fn chip(&self) -> &PsgChip {
        &self.chip
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

    /// Write one frame's registers and effect transitions to the chip.
    fn apply_frame(&mut self, index: usize) {
        let Some(&registers) = self.song.frames.get(index) else {
            return;
        };

        // R0-R12 are plain register writes; the chip masks off the effect
        // bits that YM5/YM6 smuggle into the upper nibbles.
        for (register, &value) in registers.iter().enumerate().take(13) {
            self.chip.write_register(register as u8, value);
        }
        // R13 = 0xFF means "no write": the envelope must not retrigger.
        if registers[13] != 0xFF {
            self.chip.write_register(13, registers[13]);
        }

        let commands = match self.song.format {
            YmFormat::Ym6 => decode_frame_ym6(&registers),
            YmFormat::Ym5 => decode_frame_ym5(&registers),
            _ => [EffectCommand::None; 2],
        };

        let mut sid_requested = [false; 3];
        let mut buzzer_requested = false;
        for command in commands {
            match command {
                EffectCommand::None => {}
                EffectCommand::Sid {
                    voice,
                    freq,
                    volume,
                } => {
                    self.effects.sid_start(usize::from(voice), freq, volume);
                    sid_requested[usize::from(voice)] = true;
                }
                EffectCommand::SinusSid {
                    voice,
                    freq,
                    volume,
                } => {
                    self.effects
                        .sid_sinus_start(usize::from(voice), freq, volume);
                    sid_requested[usize::from(voice)] = true;
                }
                EffectCommand::DigiDrum { voice, drum, freq } => {
                    if let Some(data) = self.song.digidrums.get(usize::from(drum)) {
                        self.effects
                            .drum_start(usize::from(voice), data.clone(), freq);
                    } else {
                        log::warn!("frame {index} references missing digidrum {drum}");
                    }
                }
                EffectCommand::SyncBuzzer { freq, shape } => {
                    // The shape comes from R13 even when R13 carried the
                    // 0xFF sentinel this frame.
                    self.chip.write_register(13, shape);
                    self.effects.sync_buzzer_start(freq);
                    buzzer_requested = true;
                }
            }
        }

        // SID and Sync Buzzer stop the frame they are no longer requested;
        // DigiDrums always play to completion.
        for voice in 0..3 {
            if !sid_requested[voice] && self.effects.sid_active(voice) {
                self.effects.sid_stop(voice);
            }
        }
        if !buzzer_requested && self.effects.sync_buzzer_enabled() {
            self.effects.sync_buzzer_stop();
        }
    }

    fn notify_frame(&mut self) {
        let current = self.sequencer.current_frame() as u32;
        let total = self.sequencer.frame_count() as u32;
        self.emit(PlayerEvent::FrameChanged { current, total });
    }
}

impl ChiptunePlayer for YmPlayer {
    fn play(&mut self) {
        if self.song.frames.is_empty() {
            self.emit(PlayerEvent::Error("no frames to play".into()));
            return;
        }
        if self.state != PlaybackState::Playing {
            // Preload the current frame so paused volumes are restored and
            // the first samples already carry frame 0's registers.
            self.apply_frame(self.sequencer.current_frame());
            self.set_state(PlaybackState::Playing);
        }
    }

    fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            // Silence the chip but keep all driver state.
            for register in 8..=10 {
                self.chip.write_register(register, 0);
            }
            self.set_state(PlaybackState::Paused);
        }
    }

    fn stop(&mut self) {
        self.sequencer.reset();
        self.chip.reset();
        self.effects.reset();
        self.loops = 0;
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
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            self.effects.tick(&mut self.chip);
            let (sl, sr) = self.chip.render_frame();
            *l = sl * self.master_volume;
            *r = sr * self.master_volume;

            match self.sequencer.advance_sample() {
                AdvanceResult::NoChange => {}
                AdvanceResult::Advanced => {
                    self.apply_frame(self.sequencer.current_frame());
                    self.notify_frame();
                }
                AdvanceResult::Looped => {
                    self.loops += 1;
                    self.apply_frame(self.sequencer.current_frame());
                    self.notify_frame();
                }
            }
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frame_rate(&self) -> u32 {
        u32::from(self.song.frame_rate)
    }

    fn current_frame(&self) -> u32 {
        self.sequencer.current_frame() as u32
    }

    fn frame_count(&self) -> u32 {
        self.sequencer.frame_count() as u32
    }

    fn loops_completed(&self) -> u32 {
        self.loops
    }

    fn seek_frame(&mut self, frame: u32) {
        self.sequencer.seek(frame as usize);
        self.effects.reset();
        self.apply_frame(self.sequencer.current_frame());
        self.notify_frame();
    }

    fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    fn set_channel_pan(&mut self, channel: usize, pan: f32) {
        self.chip.set_channel_pan(channel, pan);
    }

    fn channel_levels(&self) -> [f32; 3] {
        self.chip.channel_levels()
    }

    fn set_observer(&mut self, observer: PlayerObserver) {
        self.observer = Some(observer);
    }

    fn info(&self) -> &SongInfo {
        &self.info
    }
}
