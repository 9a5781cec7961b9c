//! MFP timer effect decoder for YM5/YM6 frames.
//!
//! Each 16-byte frame carries two effect slots:
//! - slot 1: code in `R1[7:4]`, prescaler in `R6[7:5]`, counter in `R14`
//! - slot 2: code in `R3[7:4]`, prescaler in `R8[7:5]`, counter in `R15`

/// MFP 68901 timer clock on the Atari ST, in Hz.
pub const MFP_CLOCK: u32 = 2_457_600;

/// MFP timer prescaler table; index 0 means "timer stopped".
const MFP_PRESCALER: [u32; 8] = [0, 4, 10, 16, 50, 64, 100, 200];

/// An effect request decoded from one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectCommand {
    /// No effect in this slot.
    None,
    /// SID voice: square-wave amplitude gating of one channel.
    Sid {
        /// Channel index (0-2).
        voice: u8,
        /// Gating frequency in Hz.
        freq: u32,
        /// Gate-open volume (0-15).
        volume: u8,
    },
    /// Sinus SID: sinusoidal amplitude modulation of one channel.
    SinusSid {
        /// Channel index (0-2).
        voice: u8,
        /// Modulation frequency in Hz.
        freq: u32,
        /// Peak volume (0-15).
        volume: u8,
    },
    /// DigiDrum: PCM sample playback on one channel.
    DigiDrum {
        /// Channel index (0-2).
        voice: u8,
        /// Index into the file's DigiDrum bank.
        drum: u8,
        /// Playback rate in Hz.
        freq: u32,
    },
    /// Sync Buzzer: retrigger the envelope at a timer rate.
    SyncBuzzer {
        /// Retrigger frequency in Hz.
        freq: u32,
        /// Envelope shape, read from R13 even when R13 is the 0xFF
        /// "no write" sentinel.
        shape: u8,
    },
}

/// Resolve an MFP timer setting to a frequency. A stopped prescaler or a
/// zero counter means no effect.
fn timer_freq(prescaler_bits: u8, counter: u8) -> Option<u32> {
    let prescaler = MFP_PRESCALER[usize::from((prescaler_bits >> 5) & 0x07)];
    if prescaler == 0 || counter == 0 {
        return None;
    }
    Some(MFP_CLOCK / (prescaler * u32::from(counter)))
}

/// Decode both effect slots of a YM6 frame.
pub fn decode_frame_ym6(registers: &[u8; 16]) -> [EffectCommand; 2] {
    [
        decode_ym6_slot(registers[1], registers[6], registers[14], registers),
        decode_ym6_slot(registers[3], registers[8], registers[15], registers),
    ]
}

/// YM6 code nibble map: 1-3 SID, 5-7 DigiDrum, 9-11 Sinus SID,
/// 13-15 Sync Buzzer; 4, 8 and 12 are reserved and decode to none.
fn decode_ym6_slot(
    code_reg: u8,
    prescaler_reg: u8,
    counter_reg: u8,
    registers: &[u8; 16],
) -> EffectCommand {
    let code = (code_reg >> 4) & 0x0F;
    if code == 0 {
        return EffectCommand::None;
    }
    let Some(freq) = timer_freq(prescaler_reg, counter_reg) else {
        return EffectCommand::None;
    };

    match code {
        0x1..=0x3 => {
            let voice = code - 1;
            EffectCommand::Sid {
                voice,
                freq,
                volume: registers[8 + usize::from(voice)] & 0x0F,
            }
        }
        0x5..=0x7 => {
            let voice = code - 5;
            EffectCommand::DigiDrum {
                voice,
                drum: registers[8 + usize::from(voice)] & 0x1F,
                freq,
            }
        }
        0x9..=0xB => {
            let voice = code - 9;
            EffectCommand::SinusSid {
                voice,
                freq,
                volume: registers[8 + usize::from(voice)] & 0x0F,
            }
        }
        0xD..=0xF => EffectCommand::SyncBuzzer {
            freq,
            shape: registers[13] & 0x0F,
        },
        _ => EffectCommand::None,
    }
}

/// Decode the YM5 effect encoding: a 2-bit SID voice selector in `R1[5:4]`
/// (timer from R6/R14) and a 2-bit DigiDrum selector in `R3[5:4]`
/// (drum index from the voice's volume register, timer from R8/R15).
pub fn decode_frame_ym5(registers: &[u8; 16]) -> [EffectCommand; 2] {
    let mut slots = [EffectCommand::None; 2];

    let sid_code = (registers[1] >> 4) & 0x03;
    if sid_code != 0
        && let Some(freq) = timer_freq(registers[6], registers[14])
    {
        let voice = sid_code - 1;
        slots[0] = EffectCommand::Sid {
            voice,
            freq,
            volume: registers[8 + usize::from(voice)] & 0x0F,
        };
    }

    let drum_code = (registers[3] >> 4) & 0x03;
    if drum_code != 0
        && let Some(freq) = timer_freq(registers[8], registers[15])
    {
        let voice = drum_code - 1;
        slots[1] = EffectCommand::DigiDrum {
            voice,
            drum: registers[8 + usize::from(voice)] & 0x1F,
            freq,
        };
    }

    slots
}
