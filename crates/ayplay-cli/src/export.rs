//! Offline WAV rendering.

use std::path::Path;

use ayplay_common::{ChiptunePlayer, PlaybackState};

use crate::player_factory::PlayerError;

/// Hard ceiling on export length, in seconds.
const MAX_EXPORT_SECONDS: u32 = 60 * 60;

/// Render a song to a 16-bit stereo WAV file.
///
/// Renders from the player's current position until the requested number
/// of loops completed (or the player stopped on its own).
pub fn export_to_wav<P: AsRef<Path>>(
    player: &mut dyn ChiptunePlayer,
    path: P,
    loops: u32,
) -> Result<(), PlayerError> {
    let sample_rate = player.sample_rate();
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|err| PlayerError::Export(err.to_string()))?;

    let loops = loops.max(1);
    let mut left = vec![0.0f32; 4096];
    let mut right = vec![0.0f32; 4096];
    let max_samples = u64::from(sample_rate) * u64::from(MAX_EXPORT_SECONDS);
    let mut written = 0u64;

    player.play();
    while player.state() == PlaybackState::Playing
        && player.loops_completed() < loops
        && written < max_samples
    {
        player.render(&mut left, &mut right);
        for (&l, &r) in left.iter().zip(right.iter()) {
            writer
                .write_sample((l.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .and_then(|()| writer.write_sample((r.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
                .map_err(|err| PlayerError::Export(err.to_string()))?;
        }
        written += left.len() as u64;
    }
    player.stop();

    writer
        .finalize()
        .map_err(|err| PlayerError::Export(err.to_string()))
}
