//! Audio device integration using rodio.
//!
//! A custom [`Source`] drains the shared ring buffer; underruns play
//! silence instead of stalling the device.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

use super::RingBuffer;
use crate::player_factory::PlayerError;

/// Stereo source reading interleaved samples from the ring buffer.
struct RingBufferSource {
    ring: Arc<RingBuffer>,
    sample_rate: u32,
    finished: Arc<AtomicBool>,
    chunk: Vec<f32>,
    chunk_len: usize,
    chunk_pos: usize,
}

impl RingBufferSource {
    fn new(ring: Arc<RingBuffer>, sample_rate: u32, finished: Arc<AtomicBool>) -> Self {
        Self {
            ring,
            sample_rate,
            finished,
            chunk: vec![0.0; 2048],
            chunk_len: 0,
            chunk_pos: 0,
        }
    }
}

impl Iterator for RingBufferSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.chunk_pos >= self.chunk_len {
            let read = self.ring.read(&mut self.chunk);
            if read == 0 {
                if self.finished.load(Ordering::Acquire) {
                    return None;
                }
                // Underrun: keep the stream alive with silence.
                return Some(0.0);
            }
            self.chunk_len = read;
            self.chunk_pos = 0;
        }
        let sample = self.chunk[self.chunk_pos];
        self.chunk_pos += 1;
        Some(sample)
    }
}

impl Source for RingBufferSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Opened audio output bound to a ring buffer.
pub struct AudioDevice {
    // Held for the lifetime of the stream.
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
    finished: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Open the default output device and start draining the ring buffer.
    pub fn open(ring: Arc<RingBuffer>, sample_rate: u32) -> Result<Self, PlayerError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|err| PlayerError::AudioUnavailable(err.to_string()))?;
        let sink =
            Sink::try_new(&handle).map_err(|err| PlayerError::AudioUnavailable(err.to_string()))?;

        let finished = Arc::new(AtomicBool::new(false));
        sink.append(RingBufferSource::new(ring, sample_rate, finished.clone()));

        Ok(Self {
            _stream: stream,
            _handle: handle,
            sink,
            finished,
        })
    }

    /// Signal end of input and block until the buffered tail has played.
    pub fn finish(self) {
        self.finished.store(true, Ordering::Release);
        self.sink.sleep_until_end();
    }
}
