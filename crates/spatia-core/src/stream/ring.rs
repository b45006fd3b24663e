//! Relocatable multichannel ring buffer
//!
//! Shared between the audio thread (reader) and a streaming thread
//! (writer). Each side has its own lock and only ever `try_lock`s it, so a
//! contended call returns zero frames instead of blocking. Relocation
//! (seeking) takes both locks and is only performed by the writer.
//!
//! One slot is always kept free: a buffer of `capacity` frames holds at
//! most `capacity - 1`, and `read == write` means empty.

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{ConfigError, ConfigResult};
use crate::types::Sample;

/// Marker for "no relocation pending"
pub const INVALID_LOCATION: i64 = i64::MIN;

/// Interleaved frame ring with independent read/write locks and a
/// timeline location counter
#[derive(Debug)]
pub struct RelocatableRingBuffer {
    /// Sample bits, `capacity * channels`, interleaved by frame
    data: Box<[AtomicU32]>,
    channels: usize,
    capacity: usize,
    read_pos: AtomicUsize,
    write_pos: AtomicUsize,
    read_lock: Mutex<()>,
    write_lock: Mutex<()>,
    /// Timeline position of the next frame to be read
    current_location: AtomicI64,
    requested_location: AtomicI64,
}

impl RelocatableRingBuffer {
    /// Allocate a ring of `capacity` frames (`capacity - 1` usable)
    pub fn new(capacity: usize, channels: usize) -> ConfigResult<Self> {
        if capacity < 2 || channels == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        let data = (0..capacity * channels)
            .map(|_| AtomicU32::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Ok(Self {
            data,
            channels,
            capacity,
            read_pos: AtomicUsize::new(0),
            write_pos: AtomicUsize::new(0),
            read_lock: Mutex::new(()),
            write_lock: Mutex::new(()),
            current_location: AtomicI64::new(0),
            requested_location: AtomicI64::new(INVALID_LOCATION),
        })
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Allocated frames; one less than this can be stored
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn filled(&self, r: usize, w: usize) -> usize {
        (w + self.capacity - r) % self.capacity
    }

    /// Frames available for reading (0 if the read side is busy)
    pub fn read_space(&self) -> usize {
        match self.read_lock.try_lock() {
            Ok(_guard) => self.filled(
                self.read_pos.load(Ordering::Relaxed),
                self.write_pos.load(Ordering::Acquire),
            ),
            Err(_) => 0,
        }
    }

    /// Frames that can be written (0 if the write side is busy)
    pub fn write_space(&self) -> usize {
        match self.write_lock.try_lock() {
            Ok(_guard) => {
                let used = self.filled(
                    self.read_pos.load(Ordering::Acquire),
                    self.write_pos.load(Ordering::Relaxed),
                );
                self.capacity - 1 - used
            }
            Err(_) => 0,
        }
    }

    /// Read up to `dst.len() / channels` interleaved frames
    ///
    /// Returns the number of frames read, which may be less than requested
    /// (or zero if the read side is busy). Advances the current location by
    /// the same amount.
    pub fn read(&self, dst: &mut [Sample]) -> usize {
        let frames = dst.len() / self.channels;
        self.read_impl(Some(dst), frames)
    }

    /// Discard up to `frames` frames
    pub fn read_skip(&self, frames: usize) -> usize {
        self.read_impl(None, frames)
    }

    fn read_impl(&self, mut dst: Option<&mut [Sample]>, frames: usize) -> usize {
        let _guard = match self.read_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => return 0,
        };
        let r = self.read_pos.load(Ordering::Relaxed);
        let w = self.write_pos.load(Ordering::Acquire);
        let n = frames.min(self.filled(r, w));
        if let Some(dst) = dst.as_deref_mut() {
            for i in 0..n {
                let frame = (r + i) % self.capacity;
                let src = &self.data[frame * self.channels..(frame + 1) * self.channels];
                for (d, s) in dst[i * self.channels..(i + 1) * self.channels]
                    .iter_mut()
                    .zip(src)
                {
                    *d = f32::from_bits(s.load(Ordering::Relaxed));
                }
            }
        }
        self.read_pos
            .store((r + n) % self.capacity, Ordering::Release);
        self.current_location
            .fetch_add(n as i64, Ordering::Relaxed);
        n
    }

    /// Write up to `src.len() / channels` interleaved frames
    ///
    /// Returns the number of frames written; never blocks.
    pub fn write(&self, src: &[Sample]) -> usize {
        let frames = src.len() / self.channels;
        self.write_impl(Some(src), frames)
    }

    /// Write up to `frames` frames of silence
    pub fn write_zeros(&self, frames: usize) -> usize {
        self.write_impl(None, frames)
    }

    fn write_impl(&self, src: Option<&[Sample]>, frames: usize) -> usize {
        let _guard = match self.write_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => return 0,
        };
        let r = self.read_pos.load(Ordering::Acquire);
        let w = self.write_pos.load(Ordering::Relaxed);
        let n = frames.min(self.capacity - 1 - self.filled(r, w));
        for i in 0..n {
            let frame = (w + i) % self.capacity;
            let dst = &self.data[frame * self.channels..(frame + 1) * self.channels];
            for (ch, d) in dst.iter().enumerate() {
                let value = src.map_or(0.0, |s| s[i * self.channels + ch]);
                d.store(value.to_bits(), Ordering::Relaxed);
            }
        }
        self.write_pos
            .store((w + n) % self.capacity, Ordering::Release);
        n
    }

    /// Timeline position of the next frame to be read
    pub fn current_location(&self) -> i64 {
        self.current_location.load(Ordering::Relaxed)
    }

    /// Ask the writer to relocate to `location` (consumer side, lock free)
    ///
    /// A newer request replaces an older one that was not yet serviced.
    pub fn set_locate(&self, location: i64) {
        self.requested_location.store(location, Ordering::Release);
    }

    /// Pending relocation target, if any
    pub fn requested_location(&self) -> Option<i64> {
        match self.requested_location.load(Ordering::Acquire) {
            INVALID_LOCATION => None,
            location => Some(location),
        }
    }

    pub fn relocation_requested(&self) -> bool {
        self.requested_location().is_some()
    }

    /// Take both locks for a relocation (writer side, may block)
    ///
    /// Dropping the guard empties the buffer and moves the current location
    /// to the request that was pending when the lock was taken. A request
    /// made in the meantime stays pending.
    pub fn lock_relocate(&self) -> RelocateGuard<'_> {
        let read = self.read_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let write = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let target = self.requested_location();
        RelocateGuard {
            ring: self,
            target,
            _read: read,
            _write: write,
        }
    }

    fn reset_cursors(&self) {
        self.read_pos.store(0, Ordering::Relaxed);
        self.write_pos.store(0, Ordering::Release);
    }
}

/// Both locks of a [`RelocatableRingBuffer`] during relocation
pub struct RelocateGuard<'a> {
    ring: &'a RelocatableRingBuffer,
    target: Option<i64>,
    _read: MutexGuard<'a, ()>,
    _write: MutexGuard<'a, ()>,
}

impl RelocateGuard<'_> {
    /// Location being relocated to
    pub fn target(&self) -> Option<i64> {
        self.target
    }

    /// Finish the relocation and release both locks
    pub fn unlock(self) {}
}

impl Drop for RelocateGuard<'_> {
    fn drop(&mut self) {
        self.ring.reset_cursors();
        if let Some(target) = self.target {
            self.ring
                .current_location
                .store(target, Ordering::Relaxed);
            let _ = self.ring.requested_location.compare_exchange(
                target,
                INVALID_LOCATION,
                Ordering::AcqRel,
                Ordering::Relaxed,
            );
        }
    }
}
