//! YM5/YM6 file writer.
//!
//! Serialises a [`YmSong`] back to bytes with sequential frame layout and
//! 8-bit DigiDrum samples. `parse(serialize(song))` reproduces the register
//! content frame for frame.

use crate::error::{Result, YmError};
use crate::format::{ATTR_DRUM_4BIT, ATTR_INTERLEAVED, YmFormat, YmSong};

/// Serialise a YM5 or YM6 song. Other versions have no writable header and
/// are rejected as unsupported.
pub fn serialize(song: &YmSong) -> Result<Vec<u8>> {
    if !matches!(song.format, YmFormat::Ym5 | YmFormat::Ym6) {
        return Err(YmError::UnsupportedVersion(format!(
            "cannot serialise {}",
            song.format.name()
        )));
    }

    let mut out = Vec::with_capacity(64 + song.frames.len() * 16);
    out.extend_from_slice(song.format.magic());
    out.extend_from_slice(b"LeOnArD!");
    out.extend_from_slice(&(song.frames.len() as u32).to_be_bytes());
    // Frames are written sequentially and drums unpacked.
    let attributes = song.attributes & !(ATTR_INTERLEAVED | ATTR_DRUM_4BIT);
    out.extend_from_slice(&attributes.to_be_bytes());
    out.extend_from_slice(&(song.digidrums.len() as u16).to_be_bytes());
    out.extend_from_slice(&song.master_clock.to_be_bytes());
    out.extend_from_slice(&song.frame_rate.to_be_bytes());
    out.extend_from_slice(&song.loop_frame.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // no extra data

    for drum in &song.digidrums {
        out.extend_from_slice(&(drum.len() as u32).to_be_bytes());
        out.extend_from_slice(drum);
    }

    for text in [&song.song_name, &song.author, &song.comment] {
        out.extend_from_slice(text.as_bytes());
        out.push(0);
    }

    for frame in &song.frames {
        out.extend_from_slice(frame);
    }
    out.extend_from_slice(b"End!");
    Ok(out)
}
