//! Command-line chiptune player for YM and PT3 files.

mod args;
mod audio;
mod export;
mod player_factory;

use std::io::Write as _;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use ayplay_common::{ChiptunePlayer, PlaybackState, PlayerEvent};

use args::{CliArgs, USAGE};
use audio::{AudioDevice, BUFFER_BACKOFF_MICROS, CHUNK_FRAMES, RING_BUFFER_SAMPLES, RingBuffer};
use export::export_to_wav;
use player_factory::{PlayerError, create_player};

fn main() -> ExitCode {
    env_logger::init();

    let parsed = match args::parse() {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            eprintln!("ayplay: {error}");
            eprint!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(&parsed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("ayplay: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), PlayerError> {
    let data = std::fs::read(&args.file)?;
    log::debug!("read {} bytes from {}", data.len(), args.file);
    let mut player = create_player(&data, args.sample_rate)?;

    player.set_master_volume(args.volume);
    player.set_channel_pan(0, -args.spread);
    player.set_channel_pan(1, 0.0);
    player.set_channel_pan(2, args.spread);
    player.set_observer(Box::new(|event| {
        if let PlayerEvent::Error(message) = event {
            eprintln!("ayplay: {message}");
        }
    }));

    print_song_info(player.as_ref());

    match &args.export {
        Some(path) => {
            export_to_wav(player.as_mut(), path, args.loops)?;
            println!("rendered to {path}");
            Ok(())
        }
        None => stream_to_device(player.as_mut(), args.loops),
    }
}

fn print_song_info(player: &dyn ChiptunePlayer) {
    let info = player.info();
    println!("format : {}", info.format);
    if !info.title.is_empty() {
        println!("title  : {}", info.title);
    }
    if !info.author.is_empty() {
        println!("author : {}", info.author);
    }
    if !info.comment.is_empty() {
        println!("comment: {}", info.comment);
    }
    println!(
        "length : {} frames at {} Hz ({:.1}s)",
        info.frame_count,
        info.frame_rate,
        info.duration_seconds()
    );
}

/// Producer loop: render into the ring buffer until the loop target is hit.
fn stream_to_device(player: &mut dyn ChiptunePlayer, loops: u32) -> Result<(), PlayerError> {
    let ring = Arc::new(RingBuffer::new(RING_BUFFER_SAMPLES));
    let device = AudioDevice::open(ring.clone(), player.sample_rate())?;

    let mut left = vec![0.0f32; CHUNK_FRAMES];
    let mut right = vec![0.0f32; CHUNK_FRAMES];
    let mut interleaved = vec![0.0f32; CHUNK_FRAMES * 2];

    player.play();
    while player.state() == PlaybackState::Playing {
        if loops != 0 && player.loops_completed() >= loops {
            break;
        }

        player.render(&mut left, &mut right);
        for (index, (&l, &r)) in left.iter().zip(right.iter()).enumerate() {
            interleaved[index * 2] = l;
            interleaved[index * 2 + 1] = r;
        }

        let mut offset = 0;
        while offset < interleaved.len() {
            let written = ring.write(&interleaved[offset..]);
            offset += written;
            if written == 0 {
                std::thread::sleep(Duration::from_micros(BUFFER_BACKOFF_MICROS));
            }
        }

        print_progress(player);
    }
    player.stop();
    println!();

    // Let the buffered tail drain before tearing the stream down.
    device.finish();
    Ok(())
}

fn print_progress(player: &dyn ChiptunePlayer) {
    let current = player.current_frame();
    let total = player.frame_count();
    let rate = player.frame_rate().max(1);
    print!(
        "\rplaying {:>5.1}s / {:>5.1}s (frame {current}/{total})  ",
        f64::from(current) / f64::from(rate),
        f64::from(total) / f64::from(rate),
    );
    let _ = std::io::stdout().flush();
}
