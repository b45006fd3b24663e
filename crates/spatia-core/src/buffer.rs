//! Fixed-size multichannel sample storage
//!
//! [`ChannelBuffers`] keeps all channels of a block in one contiguous
//! allocation made at configuration time. Channels are addressed by plain
//! integer index and the storage is never resized on the audio thread.

use crate::types::Sample;

/// Non-interleaved block of `channels x frames` samples in a single arena
#[derive(Debug, Clone)]
pub struct ChannelBuffers {
    data: Vec<Sample>,
    channels: usize,
    /// Allocated frames per channel (channel stride)
    capacity: usize,
    /// Working frames per channel
    frames: usize,
}

impl ChannelBuffers {
    /// Allocate silent buffers for `channels` channels of `frames` frames
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            data: vec![0.0; channels * frames],
            channels,
            capacity: frames,
            frames,
        }
    }

    /// Build from per-channel slices (all of equal length)
    #[cfg(test)]
    pub fn from_channels(channels: &[&[Sample]]) -> Self {
        let frames = channels.first().map(|c| c.len()).unwrap_or(0);
        let mut buffers = Self::new(channels.len(), frames);
        for (ch, src) in channels.iter().enumerate() {
            assert_eq!(src.len(), frames, "Channel lengths must match");
            buffers.channel_mut(ch).copy_from_slice(src);
        }
        buffers
    }

    /// Number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels
    }

    /// Working number of frames per channel
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Allocated frames per channel
    #[cfg(test)]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Set the working frame count (real-time safe, never allocates)
    ///
    /// Panics if `frames` exceeds the allocated capacity.
    #[cfg(test)]
    #[inline]
    pub fn set_frames(&mut self, frames: usize) {
        assert!(
            frames <= self.capacity,
            "set_frames: {} exceeds capacity {}",
            frames,
            self.capacity
        );
        self.frames = frames;
    }

    /// Samples of one channel
    #[inline]
    pub fn channel(&self, ch: usize) -> &[Sample] {
        let start = ch * self.capacity;
        &self.data[start..start + self.frames]
    }

    /// Mutable samples of one channel
    #[inline]
    pub fn channel_mut(&mut self, ch: usize) -> &mut [Sample] {
        let start = ch * self.capacity;
        &mut self.data[start..start + self.frames]
    }

    /// Iterate mutably over all channels
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [Sample]> {
        let frames = self.frames;
        self.data
            .chunks_exact_mut(self.capacity.max(1))
            .take(self.channels)
            .map(move |c| &mut c[..frames])
    }

    /// Fill all channels with silence
    pub fn fill_silence(&mut self) {
        self.data.fill(0.0);
    }

    /// Add another buffer of the same shape into this one
    #[cfg(test)]
    pub fn add_buffers(&mut self, other: &ChannelBuffers) {
        assert_eq!(self.channels, other.channels, "Channel counts must match");
        assert_eq!(self.frames, other.frames, "Frame counts must match");
        for ch in 0..self.channels {
            for (dst, src) in self.channel_mut(ch).iter_mut().zip(other.channel(ch)) {
                *dst += *src;
            }
        }
    }

    /// Peak absolute value of one channel
    #[cfg(test)]
    pub fn peak(&self, ch: usize) -> Sample {
        self.channel(ch).iter().fold(0.0, |m, s| m.max(s.abs()))
    }
}

/// Channel index of a first-order B-format block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum FoaChannel {
    W = 0,
    X = 1,
    Y = 2,
    Z = 3,
}

/// First-order ambisonic (B-format, FuMa weighted) block carrying a diffuse
/// sound field
#[derive(Debug, Clone)]
pub struct FoaBlock {
    buffers: ChannelBuffers,
}

impl FoaBlock {
    /// Allocate a silent block
    pub fn new(frames: usize) -> Self {
        Self {
            buffers: ChannelBuffers::new(4, frames),
        }
    }

    /// Number of frames
    #[inline]
    pub fn frames(&self) -> usize {
        self.buffers.frames()
    }

    #[inline]
    pub fn get(&self, ch: FoaChannel) -> &[Sample] {
        self.buffers.channel(ch as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, ch: FoaChannel) -> &mut [Sample] {
        self.buffers.channel_mut(ch as usize)
    }

    #[inline]
    pub fn w(&self) -> &[Sample] {
        self.get(FoaChannel::W)
    }

    #[inline]
    pub fn x(&self) -> &[Sample] {
        self.get(FoaChannel::X)
    }

    #[inline]
    pub fn y(&self) -> &[Sample] {
        self.get(FoaChannel::Y)
    }

    #[inline]
    pub fn z(&self) -> &[Sample] {
        self.get(FoaChannel::Z)
    }

    pub fn fill_silence(&mut self) {
        self.buffers.fill_silence();
    }
}

/// Accumulate `gain * src` into `dst`
#[inline]
pub fn mix_into(dst: &mut [Sample], src: &[Sample], gain: Sample) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d += gain * *s;
    }
}
