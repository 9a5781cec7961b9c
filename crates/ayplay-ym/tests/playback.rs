//! End-to-end YM playback scenarios through the public API.

use ayplay_common::ChiptunePlayer;
use ayplay_ym::{YmFormat, YmPlayer, parser, serializer};

/// Minimal YM3: header plus 14 all-zero interleaved frames.
fn silent_ym3() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"YM3!");
    data.extend_from_slice(&[0u8; 14 * 14]);
    data
}

#[test]
fn minimal_ym3_plays_silence() {
    let song = parser::parse(&silent_ym3()).unwrap();
    assert_eq!(song.frame_count(), 14);

    let mut player = YmPlayer::from_song(song, 44_100);
    player.play();

    let mut left = vec![0.5f32; 4096];
    let mut right = vec![0.5f32; 4096];
    player.render(&mut left, &mut right);
    assert!(left.iter().all(|&s| s == 0.0));
    assert!(right.iter().all(|&s| s == 0.0));
    assert!(player.current_frame() < player.frame_count());
}

#[test]
fn current_frame_stays_in_range_across_loops() {
    let mut player = YmPlayer::load_with_rate(&silent_ym3(), 44_100).unwrap();
    player.play();
    let mut left = vec![0.0f32; 1024];
    let mut right = vec![0.0f32; 1024];
    // Render far past the end; the cursor must wrap, never overflow.
    for _ in 0..40 {
        player.render(&mut left, &mut right);
        assert!(player.current_frame() < player.frame_count());
    }
    assert!(player.loops_completed() >= 1);
    assert_eq!(player.song().loop_frame, 0);
}

#[test]
fn serialised_ym6_round_trips_through_the_player() {
    let mut frames = Vec::new();
    for index in 0..25u8 {
        let mut frame = [0u8; 16];
        frame[0] = index;
        frame[8] = index & 0x0F;
        frames.push(frame);
    }
    let original = ayplay_ym::YmSong {
        format: YmFormat::Ym6,
        attributes: 0,
        master_clock: 2_000_000,
        frame_rate: 50,
        loop_frame: 10,
        song_name: "Loop Test".into(),
        author: "".into(),
        comment: "".into(),
        digidrums: Vec::new(),
        frames,
    };

    let bytes = serializer::serialize(&original).unwrap();
    let reparsed = parser::parse(&bytes).unwrap();
    assert_eq!(reparsed.frames, original.frames);

    let mut player = YmPlayer::from_song(reparsed, 44_100);
    player.play();
    let mut left = vec![0.0f32; 882 * 30];
    let mut right = vec![0.0f32; 882 * 30];
    player.render(&mut left, &mut right);
    // 25 frames then wrap to frame 10.
    assert!(player.loops_completed() >= 1);
    assert!(player.current_frame() >= 10);
}
