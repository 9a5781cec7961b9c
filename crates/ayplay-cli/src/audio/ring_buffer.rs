//! Single-producer single-consumer sample ring buffer.
//!
//! The generator thread writes, the audio callback reads. Buffer access is
//! guarded by a `parking_lot` mutex while the positions are atomics, so
//! `available_read` is cheap from either side.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity ring buffer of f32 samples.
///
/// Capacity is rounded up to a power of two so wrapping is a mask.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Mutex<Vec<f32>>,
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
    capacity: usize,
    mask: usize,
}

impl RingBuffer {
    /// Create a buffer with at least `requested` samples of capacity.
    ///
    /// # Panics
    ///
    /// Panics if `requested` is zero.
    pub fn new(requested: usize) -> Self {
        assert!(requested > 0, "ring buffer capacity must be non-zero");
        let capacity = requested.next_power_of_two();
        Self {
            buffer: Mutex::new(vec![0.0; capacity]),
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
            capacity,
            mask: capacity - 1,
        }
    }

    /// Samples currently available to read.
    pub fn available_read(&self) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Free space available to write.
    pub fn available_write(&self) -> usize {
        self.capacity - self.available_read() - 1
    }

    /// Write as many samples as fit; returns the number written.
    pub fn write(&self, samples: &[f32]) -> usize {
        let mut buffer = self.buffer.lock();
        let write = self.write_pos.load(Ordering::Acquire);
        let available = self.capacity - self.available_read() - 1;
        let count = samples.len().min(available);
        if count == 0 {
            return 0;
        }

        let start = write & self.mask;
        if start + count <= self.capacity {
            buffer[start..start + count].copy_from_slice(&samples[..count]);
        } else {
            let first = self.capacity - start;
            buffer[start..].copy_from_slice(&samples[..first]);
            buffer[..count - first].copy_from_slice(&samples[first..count]);
        }
        drop(buffer);

        self.write_pos.store(write + count, Ordering::Release);
        count
    }

    /// Read up to `dest.len()` samples; returns the number read.
    pub fn read(&self, dest: &mut [f32]) -> usize {
        let buffer = self.buffer.lock();
        let read = self.read_pos.load(Ordering::Acquire);
        let count = dest.len().min(self.available_read());
        if count == 0 {
            return 0;
        }

        let start = read & self.mask;
        if start + count <= self.capacity {
            dest[..count].copy_from_slice(&buffer[start..start + count]);
        } else {
            let first = self.capacity - start;
            dest[..first].copy_from_slice(&buffer[start..]);
            dest[first..count].copy_from_slice(&buffer[..count - first]);
        }
        drop(buffer);

        self.read_pos.store(read + count, Ordering::Release);
        count
    }

    /// Fill fraction in [0, 1].
    pub fn fill_fraction(&self) -> f32 {
        self.available_read() as f32 / self.capacity as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rounds_to_power_of_two() {
        let ring = RingBuffer::new(1000);
        assert_eq!(ring.capacity, 1024);
    }

    #[test]
    fn write_then_read_roundtrips() {
        let ring = RingBuffer::new(16);
        let samples = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(ring.write(&samples), 4);
        assert_eq!(ring.available_read(), 4);

        let mut dest = [0.0; 4];
        assert_eq!(ring.read(&mut dest), 4);
        assert_eq!(dest, samples);
        assert_eq!(ring.available_read(), 0);
    }

    #[test]
    fn wraparound_preserves_order() {
        let ring = RingBuffer::new(8);
        ring.write(&[1.0; 6]);
        let mut sink = [0.0; 5];
        ring.read(&mut sink);
        // Cross the boundary.
        ring.write(&[2.0, 3.0, 4.0, 5.0]);
        let mut dest = [0.0; 5];
        assert_eq!(ring.read(&mut dest), 5);
        assert_eq!(dest, [1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn full_buffer_rejects_writes() {
        let ring = RingBuffer::new(8);
        assert_eq!(ring.write(&[1.0; 16]), 7, "one slot stays free");
        assert_eq!(ring.write(&[1.0; 4]), 0);
    }

    #[test]
    fn concurrent_producer_consumer() {
        use std::sync::Arc;
        let ring = Arc::new(RingBuffer::new(1 << 12));
        let producer_ring = ring.clone();

        let producer = std::thread::spawn(move || {
            let mut value = 0u32;
            while value < 10_000 {
                let chunk: Vec<f32> = (value..value + 64).map(|v| v as f32).collect();
                let mut offset = 0;
                while offset < chunk.len() {
                    let written = producer_ring.write(&chunk[offset..]);
                    offset += written;
                    if written == 0 {
                        std::thread::yield_now();
                    }
                }
                value += 64;
            }
        });

        let mut expected = 0f32;
        let mut dest = [0.0f32; 128];
        while expected < 10_000.0 {
            let read = ring.read(&mut dest);
            for &sample in &dest[..read] {
                assert_eq!(sample, expected);
                expected += 1.0;
            }
            if read == 0 {
                std::thread::yield_now();
            }
        }
        producer.join().unwrap();
    }
}
