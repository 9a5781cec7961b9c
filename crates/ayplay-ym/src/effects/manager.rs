//! Per-sample effect engines.
//!
//! The manager keeps the state of the three effect engines (SID gating,
//! DigiDrum playback, Sync Buzzer retrigger) and applies them to the chip
//! once per output sample, before the chip renders that sample.
//!
//! Some files encode nonsensical timer rates well above 10 kHz; SID and
//! Sync Buzzer frequencies are silently capped at a quarter of the sample
//! rate as an aliasing guard.

use std::sync::Arc;

use ayplay_core::PsgChip;

/// Fixed-point fraction bits of the DigiDrum playback position.
const DRUM_PRECISION: u32 = 15;

/// Scale applied to 8-bit DigiDrum samples on the channel DAC.
const DRUM_GAIN: f32 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SidMode {
    Square,
    Sinus,
}

/// One channel's SID gating state.
#[derive(Debug, Clone)]
struct SidVoice {
    active: bool,
    pos: u32,
    step: u32,
    volume: u8,
    mode: SidMode,
}

impl Default for SidVoice {
    fn default() -> Self {
        Self {
            active: false,
            pos: 0,
            step: 0,
            volume: 0,
            mode: SidMode::Square,
        }
    }
}

/// One channel's DigiDrum playback state.
#[derive(Debug, Clone, Default)]
struct DrumVoice {
    active: bool,
    data: Option<Arc<[u8]>>,
    pos: u32,
    step: u32,
}

impl DrumVoice {
    fn current_sample(&self) -> Option<f32> {
        let data = self.data.as_ref()?;
        let index = (self.pos >> DRUM_PRECISION) as usize;
        data.get(index)
            .map(|&byte| f32::from(byte) / 255.0 * DRUM_GAIN)
    }

    fn advance(&mut self) {
        self.pos = self.pos.wrapping_add(self.step);
    }
}

/// Runs the YM special effects against a PSG chip.
pub struct EffectsManager {
    sample_rate: u32,

    sync_buzzer_enabled: bool,
    sync_buzzer_phase: u32,
    sync_buzzer_step: u32,

    sid: [SidVoice; 3],
    drum: [DrumVoice; 3],
}

impl EffectsManager {
    /// Create a manager for the given output sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            sync_buzzer_enabled: false,
            sync_buzzer_phase: 0,
            sync_buzzer_step: 0,
            sid: [SidVoice::default(), SidVoice::default(), SidVoice::default()],
            drum: [DrumVoice::default(), DrumVoice::default(), DrumVoice::default()],
        }
    }

    /// Stop all effects and clear their state.
    pub fn reset(&mut self) {
        self.sync_buzzer_enabled = false;
        self.sync_buzzer_phase = 0;
        self.sync_buzzer_step = 0;
        for voice in 0..3 {
            self.sid[voice] = SidVoice::default();
            self.drum[voice] = DrumVoice::default();
        }
    }

    #[inline]
    fn capped(&self, freq: u32) -> u32 {
        freq.min(self.sample_rate / 4)
    }

    #[inline]
    fn phase_step(&self, freq: u32) -> u32 {
        ((u64::from(self.capped(freq)) << 31) / u64::from(self.sample_rate)) as u32
    }

    // ------------------------------------------------------------------
    // Sync Buzzer
    // ------------------------------------------------------------------

    /// Start (or restart) the Sync Buzzer at a timer frequency.
    pub fn sync_buzzer_start(&mut self, freq: u32) {
        self.sync_buzzer_step = self.phase_step(freq);
        self.sync_buzzer_phase = 0;
        self.sync_buzzer_enabled = true;
    }

    /// Stop the Sync Buzzer.
    pub fn sync_buzzer_stop(&mut self) {
        self.sync_buzzer_enabled = false;
        self.sync_buzzer_phase = 0;
        self.sync_buzzer_step = 0;
    }

    /// Whether the Sync Buzzer is running.
    pub fn sync_buzzer_enabled(&self) -> bool {
        self.sync_buzzer_enabled
    }

    // ------------------------------------------------------------------
    // SID voices
    // ------------------------------------------------------------------

    /// Start square-wave SID gating on a voice. The phase is preserved when
    /// the voice was already active, so per-frame restarts do not pop.
    pub fn sid_start(&mut self, voice: usize, freq: u32, volume: u8) {
        self.sid_start_mode(voice, freq, volume, SidMode::Square);
    }

    /// Start sinusoidal SID modulation on a voice.
    pub fn sid_sinus_start(&mut self, voice: usize, freq: u32, volume: u8) {
        self.sid_start_mode(voice, freq, volume, SidMode::Sinus);
    }

    fn sid_start_mode(&mut self, voice: usize, freq: u32, volume: u8, mode: SidMode) {
        let step = self.phase_step(freq);
        let Some(sid) = self.sid.get_mut(voice) else {
            return;
        };
        sid.step = step;
        sid.volume = volume & 0x0F;
        if !sid.active {
            sid.pos = 0;
        }
        sid.mode = mode;
        sid.active = true;
    }

    /// Stop SID gating on a voice.
    pub fn sid_stop(&mut self, voice: usize) {
        if let Some(sid) = self.sid.get_mut(voice) {
            *sid = SidVoice::default();
        }
    }

    /// Whether a voice has SID gating active.
    pub fn sid_active(&self, voice: usize) -> bool {
        self.sid.get(voice).is_some_and(|sid| sid.active)
    }

    // ------------------------------------------------------------------
    // DigiDrums
    // ------------------------------------------------------------------

    /// Start DigiDrum playback on a voice from sample position zero.
    /// A drum always plays to completion; retriggering restarts it.
    pub fn drum_start(&mut self, voice: usize, data: Arc<[u8]>, freq: u32) {
        let Some(drum) = self.drum.get_mut(voice) else {
            return;
        };
        *drum = DrumVoice {
            active: true,
            pos: 0,
            step: ((u64::from(freq) << DRUM_PRECISION) / u64::from(self.sample_rate)) as u32,
            data: Some(data),
        };
    }

    /// Whether a voice is currently playing a DigiDrum.
    pub fn drum_active(&self, voice: usize) -> bool {
        self.drum.get(voice).is_some_and(|drum| drum.active)
    }

    // ------------------------------------------------------------------
    // Per-sample tick
    // ------------------------------------------------------------------

    /// Advance all engines by one output sample. Must run before the chip
    /// renders the sample so register writes land in the same frame.
    pub fn tick(&mut self, chip: &mut PsgChip) {
        if self.sync_buzzer_enabled {
            self.sync_buzzer_phase = self.sync_buzzer_phase.wrapping_add(self.sync_buzzer_step);
            if self.sync_buzzer_phase & 0x8000_0000 != 0 {
                chip.trigger_envelope();
                self.sync_buzzer_phase &= 0x7FFF_FFFF;
            }
        }

        for voice in 0..3 {
            let sid = &mut self.sid[voice];
            if sid.active {
                let level = match sid.mode {
                    SidMode::Square => {
                        if sid.pos & 0x8000_0000 != 0 {
                            sid.volume
                        } else {
                            0
                        }
                    }
                    SidMode::Sinus => {
                        let phase = sid.pos as f32 * (std::f32::consts::TAU / u32::MAX as f32);
                        let shaped = 0.5 * (1.0 + phase.sin()) * f32::from(sid.volume);
                        (shaped.round() as i32).clamp(0, 15) as u8
                    }
                };
                chip.write_register(8 + voice as u8, level);
                sid.pos = sid.pos.wrapping_add(sid.step);
            }
        }

        for voice in 0..3 {
            let drum = &mut self.drum[voice];
            if drum.active {
                match drum.current_sample() {
                    Some(value) => {
                        chip.set_drum_override(voice, Some(value));
                        drum.advance();
                    }
                    None => {
                        *drum = DrumVoice::default();
                        chip.set_drum_override(voice, None);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digidrum_plays_to_completion_then_releases_the_channel() {
        let sample_rate = 48_000;
        let mut chip = PsgChip::with_clocks(2_000_000, sample_rate);
        let mut effects = EffectsManager::new(sample_rate);

        let data: Arc<[u8]> = (0u8..10).map(|i| i * 25).collect::<Vec<_>>().into();
        // Playback rate equal to the sample rate: one PCM byte per sample.
        effects.drum_start(0, data.clone(), sample_rate);

        for (index, &byte) in data.iter().enumerate() {
            effects.tick(&mut chip);
            let (left, _) = chip.render_frame();
            let expected = f32::from(byte) / 255.0 * DRUM_GAIN * (0.5f32).sqrt() / 3.0;
            assert!(
                (left - expected).abs() < 1e-6,
                "sample {index}: got {left}, want {expected}"
            );
        }

        // Sample exhausted: channel reverts to the silent mixer gate.
        effects.tick(&mut chip);
        assert!(!effects.drum_active(0));
        let (left, _) = chip.render_frame();
        assert_eq!(left, 0.0);
    }

    #[test]
    fn square_sid_gates_the_volume_register() {
        let sample_rate = 48_000;
        let mut chip = PsgChip::with_clocks(2_000_000, sample_rate);
        let mut effects = EffectsManager::new(sample_rate);

        effects.sid_start(1, 6_000, 12);
        let mut seen = [false; 2];
        for _ in 0..64 {
            effects.tick(&mut chip);
            match chip.read_register(9) {
                0 => seen[0] = true,
                12 => seen[1] = true,
                other => panic!("unexpected gate level {other}"),
            }
        }
        assert!(seen[0] && seen[1], "gate must toggle between 0 and volume");
    }

    #[test]
    fn sid_restart_keeps_phase() {
        let mut effects = EffectsManager::new(48_000);
        let mut chip = PsgChip::with_clocks(2_000_000, 48_000);
        effects.sid_start(0, 6_000, 15);
        for _ in 0..10 {
            effects.tick(&mut chip);
        }
        let pos_before = effects.sid[0].pos;
        effects.sid_start(0, 6_000, 15);
        assert_eq!(effects.sid[0].pos, pos_before);
    }

    #[test]
    fn sync_buzzer_retriggers_envelope_at_phase_wrap() {
        let sample_rate = 48_000;
        let mut chip = PsgChip::with_clocks(2_000_000, sample_rate);
        let mut effects = EffectsManager::new(sample_rate);

        chip.write_register(11, 0xFF); // slow envelope
        chip.write_register(13, 0x0E);
        // Let the envelope crawl away from the trigger position.
        for _ in 0..100 {
            let _ = chip.render_frame();
        }
        assert!(chip.envelope_position() > -64);

        effects.sync_buzzer_start(6_000);
        let mut retriggered = false;
        for _ in 0..16 {
            effects.tick(&mut chip);
            if chip.envelope_position() == -64 {
                retriggered = true;
                break;
            }
            let _ = chip.render_frame();
        }
        assert!(retriggered, "buzzer must reset the envelope position");
    }

    #[test]
    fn frequencies_are_capped_at_quarter_sample_rate() {
        let effects = EffectsManager::new(48_000);
        assert_eq!(effects.capped(1_000_000), 12_000);
        assert_eq!(effects.capped(5_000), 5_000);
    }
}
