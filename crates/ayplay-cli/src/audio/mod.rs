//! Real-time audio output.
//!
//! The generator thread renders interleaved stereo samples into a ring
//! buffer; the audio device drains it from the playback thread. Memory is
//! fixed at the buffer size regardless of song length.

mod device;
mod ring_buffer;

pub use device::AudioDevice;
pub use ring_buffer::RingBuffer;

/// Backoff while the ring buffer is full, in microseconds.
pub const BUFFER_BACKOFF_MICROS: u64 = 100;

/// Ring buffer capacity in samples (~0.7 s of stereo audio at 44.1 kHz).
pub const RING_BUFFER_SAMPLES: usize = 64 * 1024;

/// Samples rendered per producer chunk (per channel).
pub const CHUNK_FRAMES: usize = 1024;
