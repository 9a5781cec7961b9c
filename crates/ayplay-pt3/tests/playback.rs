//! End-to-end PT3 playback through the public API.

use ayplay_common::{ChiptunePlayer, PlaybackState};
use ayplay_pt3::{Pt3Player, parser};

/// Hand-assembled one-position module: channel A plays note 10 with
/// sample 1 at full volume, channels B and C rest.
fn simple_module() -> Vec<u8> {
    let mut data = vec![0u8; 201];
    data[..13].copy_from_slice(b"ProTracker 3.");
    data[13] = b'6';
    data[0x1E..0x1E + 5].copy_from_slice(b"Probe");
    data[99] = 0; // PT tone table
    data[100] = 6;
    data[101] = 1;
    data[102] = 0;

    data.push(0); // position 0 -> pattern 0
    data.push(0xFF);

    let sample_ptr = data.len() as u16;
    data.extend_from_slice(&[0, 1]);
    data.extend_from_slice(&[0x01, 0x8F, 0x00, 0x00]);

    let ornament_ptr = data.len() as u16;
    data.extend_from_slice(&[0, 1, 0]);

    let stream_a = data.len() as u16;
    data.extend_from_slice(&[0xD1, 0xCF, 0x5A, 0x00]);
    let stream_b = data.len() as u16;
    data.extend_from_slice(&[0xD0, 0x00]);
    let stream_c = data.len() as u16;
    data.extend_from_slice(&[0xD0, 0x00]);

    let patterns_ptr = data.len() as u16;
    for pointer in [stream_a, stream_b, stream_c] {
        data.extend_from_slice(&pointer.to_le_bytes());
    }

    data[103..105].copy_from_slice(&patterns_ptr.to_le_bytes());
    data[105 + 2..105 + 4].copy_from_slice(&sample_ptr.to_le_bytes());
    data[169..171].copy_from_slice(&ornament_ptr.to_le_bytes());
    data
}

#[test]
fn simple_module_produces_audio() {
    let file = parser::parse(&simple_module()).unwrap();
    assert!(!file.is_turbo_sound());
    assert_eq!(file.modules[0].title, "Probe");

    let mut player = Pt3Player::from_file(file, 44_100);
    assert!(player.frame_count() > 0);

    player.play();
    let mut left = vec![0.0f32; 8192];
    let mut right = vec![0.0f32; 8192];
    player.render(&mut left, &mut right);
    assert!(
        left.iter().any(|&s| s > 0.0),
        "a full-volume note must be audible"
    );
    assert_eq!(player.state(), PlaybackState::Playing);
}

#[test]
fn positions_reference_valid_patterns() {
    let file = parser::parse(&simple_module()).unwrap();
    let module = &file.modules[0];
    assert!(
        module
            .positions
            .iter()
            .all(|&index| index < module.patterns.len())
    );
}

#[test]
fn render_is_deterministic_across_stop() {
    let mut player = Pt3Player::load_with_rate(&simple_module(), 48_000).unwrap();

    player.play();
    let mut first_left = vec![0.0f32; 4096];
    let mut scratch = vec![0.0f32; 4096];
    player.render(&mut first_left, &mut scratch);

    player.stop();
    player.play();
    let mut second_left = vec![0.0f32; 4096];
    player.render(&mut second_left, &mut scratch);

    assert_eq!(first_left, second_left);
}
