//! PT3 module parser.
//!
//! Fields are little-endian. The 99-byte ASCII header is followed by the
//! tone-table id, timing bytes, the pattern-table pointer, 32 sample and
//! 16 ornament pointers, and the 0xFF-terminated position list. TurboSound
//! files are two concatenated modules; the second is found by scanning for
//! another tracker signature from offset 256 on.

use crate::error::{Pt3Error, Result};
use crate::format::{Pt3File, Pt3Module, Pt3Ornament, Pt3Pattern, Pt3Sample, SampleFrame};

/// Minimum size of a module: fixed header plus the position terminator.
const MIN_MODULE_SIZE: usize = 202;

/// Safety cap on a single channel's bytecode stream.
const PATTERN_STREAM_CAP: usize = 2048;

const SAMPLE_BANK_SIZE: usize = 32;
const ORNAMENT_BANK_SIZE: usize = 16;

/// Check whether a byte slice looks like a PT3 module.
pub fn is_pt3_format(data: &[u8]) -> bool {
    data.len() >= MIN_MODULE_SIZE && find_signature(&data[..99]).is_some()
}

fn find_signature(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(6)
        .position(|window| window == b"Vortex" || window.starts_with(b"ProTr"))
}

/// Parse a PT3 file, splitting off a concatenated TurboSound second module
/// when one is present.
pub fn parse(data: &[u8]) -> Result<Pt3File> {
    if data.len() < MIN_MODULE_SIZE {
        return Err("file smaller than a PT3 header".into());
    }
    if find_signature(&data[..99]).is_none() {
        return Err(Pt3Error::InvalidMagic);
    }

    let modules = match second_module_offset(data) {
        Some(split) => vec![
            parse_module(&data[..split])?,
            parse_module(&data[split..])?,
        ],
        None => vec![parse_module(data)?],
    };
    Ok(Pt3File { modules })
}

/// Find a second tracker signature at offset >= 256.
fn second_module_offset(data: &[u8]) -> Option<usize> {
    if data.len() <= 256 {
        return None;
    }
    find_signature(&data[256..]).map(|offset| offset + 256)
}

/// Parse a single PT3 module.
pub fn parse_module(data: &[u8]) -> Result<Pt3Module> {
    if data.len() < MIN_MODULE_SIZE {
        return Err("module smaller than a PT3 header".into());
    }

    let version = if data.len() > 13 && data.starts_with(b"ProTracker 3.") {
        match data[13] {
            digit @ b'0'..=b'9' => digit - b'0',
            _ => 6,
        }
    } else {
        6
    };

    let title = header_text(&data[0x1E..0x3E]);
    let author = header_text(&data[0x42..0x62]);

    let tone_table = data[99] & 0x03;
    let initial_delay = data[100].max(1);
    let declared_positions = usize::from(data[101]);
    let loop_byte = usize::from(data[102]);
    let patterns_ptr = read_le_u16(data, 103)? as usize;

    // Position list: bytes from 201 until the 0xFF terminator, each a
    // pattern index premultiplied by three (the size of a pattern-table
    // entry in words).
    let mut positions = Vec::new();
    let mut offset = 201;
    loop {
        let byte = *data
            .get(offset)
            .ok_or(Pt3Error::MalformedFile("unterminated position list".into()))?;
        if byte == 0xFF {
            break;
        }
        positions.push(usize::from(byte) / 3);
        offset += 1;
    }
    if positions.is_empty() {
        return Err("empty position list".into());
    }
    if positions.len() != declared_positions {
        log::debug!(
            "position count field {} disagrees with list length {}",
            declared_positions,
            positions.len()
        );
    }
    let loop_position = if loop_byte < positions.len() {
        loop_byte
    } else {
        log::warn!("loop position {loop_byte} out of range, looping to start");
        0
    };

    let mut samples = Vec::with_capacity(SAMPLE_BANK_SIZE);
    for index in 0..SAMPLE_BANK_SIZE {
        let pointer = read_le_u16(data, 105 + index * 2)? as usize;
        samples.push(parse_sample(data, pointer)?);
    }

    let mut ornaments = Vec::with_capacity(ORNAMENT_BANK_SIZE);
    for index in 0..ORNAMENT_BANK_SIZE {
        let pointer = read_le_u16(data, 169 + index * 2)? as usize;
        ornaments.push(parse_ornament(data, pointer)?);
    }

    let pattern_count = positions.iter().copied().max().unwrap_or(0) + 1;
    let mut patterns = Vec::with_capacity(pattern_count);
    for pattern in 0..pattern_count {
        let entry = patterns_ptr + pattern * 6;
        let mut streams: [Vec<u8>; 3] = Default::default();
        for (channel, stream) in streams.iter_mut().enumerate() {
            let pointer = read_le_u16(data, entry + channel * 2)? as usize;
            *stream = extract_stream(data, pointer, channel)?;
        }
        patterns.push(Pt3Pattern { streams });
    }

    Ok(Pt3Module {
        version,
        tone_table,
        initial_delay,
        loop_position,
        positions,
        samples,
        ornaments,
        patterns,
        title,
        author,
    })
}

fn header_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

fn read_le_u16(data: &[u8], offset: usize) -> Result<u16> {
    data.get(offset..offset + 2)
        .map(|bytes| u16::from_le_bytes([bytes[0], bytes[1]]))
        .ok_or_else(|| Pt3Error::MalformedFile(format!("u16 field at {offset} past EOF")))
}

/// Decode one sample: loop byte, length byte, then 4 bytes per line.
///
/// A null pointer or zero length yields `None`; the player mutes channels
/// that reference a missing sample.
fn parse_sample(data: &[u8], pointer: usize) -> Result<Option<Pt3Sample>> {
    if pointer == 0 {
        return Ok(None);
    }
    let header = data
        .get(pointer..pointer + 2)
        .ok_or_else(|| Pt3Error::MalformedFile(format!("sample pointer {pointer} past EOF")))?;
    let loop_position = usize::from(header[0]);
    let length = usize::from(header[1]);
    if length == 0 {
        return Ok(None);
    }
    if loop_position > length {
        return Err(format!("sample loop {loop_position} exceeds length {length}").into());
    }
    let body = data
        .get(pointer + 2..pointer + 2 + length * 4)
        .ok_or_else(|| Pt3Error::MalformedFile(format!("sample at {pointer} truncated")))?;

    let frames = body.chunks_exact(4).map(decode_sample_frame).collect();
    Ok(Some(Pt3Sample {
        loop_position: loop_position.min(length - 1),
        frames,
    }))
}

/// Sample line bit layout:
///
/// ```text
/// byte0: E SSSSS D A   byte1: N T K M VVVV   byte2/3: tone offset (i16 LE)
///        | |     | |          | | | |  |
///        | |     | +- envelope mask    +- amplitude
///        | |     +--- slide direction (1 = up)
///        | +--------- 5-bit noise/envelope offset
///        +----------- amplitude slide enable
///        N = noise mask, T = tone accumulate, K = noise/env accumulate,
///        M = tone mask
/// ```
fn decode_sample_frame(bytes: &[u8]) -> SampleFrame {
    let b0 = bytes[0];
    let b1 = bytes[1];
    let raw_offset = (b0 >> 1) & 0x1F;
    SampleFrame {
        amplitude: b1 & 0x0F,
        amplitude_slide: if b0 & 0x40 != 0 { 1 } else { -1 },
        amplitude_slide_enabled: b0 & 0x80 != 0,
        tone_offset: i16::from_le_bytes([bytes[2], bytes[3]]),
        accumulate_tone: b1 & 0x40 != 0,
        tone_mask: b1 & 0x10 != 0,
        noise_mask: b1 & 0x80 != 0,
        envelope_mask: b0 & 0x01 != 0,
        accumulate_noise: b1 & 0x20 != 0,
        noise_offset: raw_offset,
        envelope_offset: if raw_offset & 0x10 != 0 {
            raw_offset as i8 - 32
        } else {
            raw_offset as i8
        },
    }
}

/// Decode one ornament: loop byte, length byte, then signed note offsets.
fn parse_ornament(data: &[u8], pointer: usize) -> Result<Option<Pt3Ornament>> {
    if pointer == 0 {
        return Ok(None);
    }
    let header = data
        .get(pointer..pointer + 2)
        .ok_or_else(|| Pt3Error::MalformedFile(format!("ornament pointer {pointer} past EOF")))?;
    let loop_position = usize::from(header[0]);
    let length = usize::from(header[1]);
    if length == 0 {
        return Ok(None);
    }
    if loop_position > length {
        return Err(format!("ornament loop {loop_position} exceeds length {length}").into());
    }
    let body = data
        .get(pointer + 2..pointer + 2 + length)
        .ok_or_else(|| Pt3Error::MalformedFile(format!("ornament at {pointer} truncated")))?;
    Ok(Some(Pt3Ornament {
        loop_position: loop_position.min(length - 1),
        offsets: body.iter().map(|&byte| byte as i8).collect(),
    }))
}

/// Copy a channel bytecode stream up to and including its 0x00 terminator.
fn extract_stream(data: &[u8], pointer: usize, channel: usize) -> Result<Vec<u8>> {
    if pointer == 0 || pointer >= data.len() {
        return Err(format!("pattern pointer {pointer} for channel {channel} out of range").into());
    }
    let tail = &data[pointer..];
    let cap = tail.len().min(PATTERN_STREAM_CAP);
    match tail[..cap].iter().position(|&byte| byte == 0) {
        Some(end) => Ok(tail[..=end].to_vec()),
        None => Err(Pt3Error::TooLarge {
            channel,
            limit: PATTERN_STREAM_CAP,
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a minimal single-pattern module for the parser and player
    /// tests: one position, the given channel streams, one basic sample
    /// (slot 1) and an empty ornament in slot 0.
    pub(crate) fn build_module(streams: [&[u8]; 3], delay: u8) -> Vec<u8> {
        let mut data = vec![0u8; 201];
        data[..13].copy_from_slice(b"ProTracker 3.");
        data[13] = b'6';
        data[0x1E..0x1E + 4].copy_from_slice(b"Test");
        data[0x42..0x42 + 6].copy_from_slice(b"Nobody");
        data[99] = 2; // ASM tone table
        data[100] = delay;
        data[101] = 1; // one position
        data[102] = 0; // loop to start

        // Position list: pattern 0, terminator.
        data.push(0);
        data.push(0xFF);

        // Sample 1: single line, amplitude 15, tone on, noise masked,
        // envelope masked.
        let sample_ptr = data.len() as u16;
        data.extend_from_slice(&[0, 1]); // loop 0, length 1
        data.extend_from_slice(&[0x01, 0x8F, 0x00, 0x00]);

        // Ornament 0: single zero offset.
        let ornament_ptr = data.len() as u16;
        data.extend_from_slice(&[0, 1, 0]);

        // Channel streams.
        let mut stream_ptrs = [0u16; 3];
        for (channel, stream) in streams.iter().enumerate() {
            stream_ptrs[channel] = data.len() as u16;
            data.extend_from_slice(stream);
        }

        // Pattern table with one entry.
        let patterns_ptr = data.len() as u16;
        for pointer in stream_ptrs {
            data.extend_from_slice(&pointer.to_le_bytes());
        }

        data[103..105].copy_from_slice(&patterns_ptr.to_le_bytes());
        data[105 + 2..105 + 4].copy_from_slice(&sample_ptr.to_le_bytes());
        data[169..171].copy_from_slice(&ornament_ptr.to_le_bytes());
        data
    }

    #[test]
    fn rejects_non_pt3_data() {
        assert!(matches!(
            parse(&vec![0u8; 400]),
            Err(Pt3Error::InvalidMagic)
        ));
        assert!(parse(b"ProTracker 3.6").is_err());
    }

    #[test]
    fn parses_header_fields() {
        let data = build_module([&[0x00], &[0x00], &[0x00]], 6);
        let file = parse(&data).unwrap();
        assert!(!file.is_turbo_sound());

        let module = &file.modules[0];
        assert_eq!(module.version, 6);
        assert_eq!(module.tone_table, 2);
        assert_eq!(module.initial_delay, 6);
        assert_eq!(module.positions, vec![0]);
        assert_eq!(module.loop_position, 0);
        assert_eq!(module.title, "Test");
        assert_eq!(module.author, "Nobody");
        assert_eq!(module.patterns.len(), 1);
    }

    #[test]
    fn zero_delay_is_clamped() {
        let data = build_module([&[0x00], &[0x00], &[0x00]], 0);
        let module = &parse(&data).unwrap().modules[0];
        assert_eq!(module.initial_delay, 1);
    }

    #[test]
    fn sample_lines_decode_bitfields() {
        let data = build_module([&[0x00], &[0x00], &[0x00]], 6);
        let module = &parse(&data).unwrap().modules[0];
        let sample = module.samples[1].as_ref().unwrap();
        assert_eq!(sample.frames.len(), 1);

        let frame = sample.frames[0];
        assert_eq!(frame.amplitude, 15);
        assert!(frame.noise_mask);
        assert!(frame.envelope_mask);
        assert!(!frame.tone_mask);
        assert!(!frame.accumulate_tone);
        assert!(!frame.amplitude_slide_enabled);
        assert_eq!(frame.tone_offset, 0);
    }

    #[test]
    fn sample_frame_sign_extension() {
        // Offset field 0x1F -> noise 31, envelope -1; slide up enabled.
        let frame = decode_sample_frame(&[0xFE, 0x60, 0x34, 0x12]);
        assert_eq!(frame.noise_offset, 31);
        assert_eq!(frame.envelope_offset, -1);
        assert!(frame.amplitude_slide_enabled);
        assert_eq!(frame.amplitude_slide, 1);
        assert!(frame.accumulate_tone);
        assert!(frame.accumulate_noise);
        assert_eq!(frame.tone_offset, 0x1234);

        // Negative tone offset.
        let frame = decode_sample_frame(&[0x00, 0x0F, 0xFE, 0xFF]);
        assert_eq!(frame.tone_offset, -2);
        assert_eq!(frame.amplitude_slide, -1);
    }

    #[test]
    fn ornament_loop_past_length_fails() {
        let mut data = build_module([&[0x00], &[0x00], &[0x00]], 6);
        let ornament_ptr = u16::from_le_bytes([data[169], data[170]]) as usize;
        data[ornament_ptr] = 9; // loop 9 > length 1
        assert!(matches!(parse(&data), Err(Pt3Error::MalformedFile(_))));
    }

    #[test]
    fn missing_stream_terminator_is_too_large() {
        // A stream of 0x2x noise-base bytes with no terminator runs into
        // the pattern table and beyond; cap the damage.
        let stream = vec![0x21u8; PATTERN_STREAM_CAP + 8];
        let data = build_module([&stream, &[0x00], &[0x00]], 6);
        assert!(matches!(parse(&data), Err(Pt3Error::TooLarge { .. })));
    }

    #[test]
    fn pattern_pointer_out_of_range_fails() {
        let mut data = build_module([&[0x00], &[0x00], &[0x00]], 6);
        let patterns_ptr = u16::from_le_bytes([data[103], data[104]]) as usize;
        data[patterns_ptr..patterns_ptr + 2].copy_from_slice(&0xFFF0u16.to_le_bytes());
        assert!(matches!(parse(&data), Err(Pt3Error::MalformedFile(_))));
    }

    #[test]
    fn turbo_sound_modules_split_at_second_signature() {
        let first = build_module([&[0x00], &[0x00], &[0x00]], 6);
        let second = build_module([&[0x00], &[0x00], &[0x00]], 3);

        // Pad the first module out to 2048 bytes so the signature scan
        // finds the second one past offset 256.
        let mut data = first;
        data.resize(2048, 0);
        data.extend_from_slice(&second);

        let file = parse(&data).unwrap();
        assert!(file.is_turbo_sound());
        assert_eq!(file.modules.len(), 2);
        assert_eq!(file.modules[0].initial_delay, 6);
        assert_eq!(file.modules[1].initial_delay, 3);
    }

    #[test]
    fn vortex_signature_is_accepted() {
        let mut data = build_module([&[0x00], &[0x00], &[0x00]], 6);
        data[..30].fill(b' ');
        data[..21].copy_from_slice(b"Vortex Tracker II 1.0");
        let module = &parse(&data).unwrap().modules[0];
        assert_eq!(module.version, 6, "non-ProTracker header defaults to 3.6");
    }
}
