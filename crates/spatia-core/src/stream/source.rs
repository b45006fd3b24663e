//! Frame sources feeding the stream reader

use crate::error::{ConfigError, ConfigResult};
use crate::types::Sample;

/// Seekable source of interleaved frames
///
/// Decoding files is left to implementors; the reader only needs to seek
/// and pull blocks. Implementations may block (disk I/O) since they are
/// only called from the streaming thread.
pub trait BlockSource: Send {
    /// Number of interleaved channels
    fn channels(&self) -> usize;

    /// Total number of frames (`u64::MAX` for unbounded sources)
    fn frames(&self) -> u64;

    /// Move to `frame`, clamped to the end; returns the new position
    fn seek(&mut self, frame: u64) -> u64;

    /// Read up to `dst.len() / channels()` frames; returns frames read,
    /// zero at the end
    fn read(&mut self, dst: &mut [Sample]) -> usize;
}

impl<S: BlockSource + ?Sized> BlockSource for Box<S> {
    fn channels(&self) -> usize {
        (**self).channels()
    }

    fn frames(&self) -> u64 {
        (**self).frames()
    }

    fn seek(&mut self, frame: u64) -> u64 {
        (**self).seek(frame)
    }

    fn read(&mut self, dst: &mut [Sample]) -> usize {
        (**self).read(dst)
    }
}

/// Pre-decoded material held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<Sample>,
    channels: usize,
    pos: usize,
}

impl MemorySource {
    /// Wrap interleaved samples
    pub fn new(channels: usize, interleaved: Vec<Sample>) -> ConfigResult<Self> {
        if channels == 0 {
            return Err(ConfigError::StreamChannels {
                available: 0,
                required: 1,
            });
        }
        if interleaved.len() % channels != 0 {
            return Err(ConfigError::InvalidParameter {
                name: "interleaved",
                reason: format!(
                    "{} samples is not a whole number of {}-channel frames",
                    interleaved.len(),
                    channels
                ),
            });
        }
        Ok(Self {
            data: interleaved,
            channels,
            pos: 0,
        })
    }

    /// Interleave equally long channels
    pub fn from_channels(channels: &[Vec<Sample>]) -> ConfigResult<Self> {
        let frames = channels.first().map_or(0, Vec::len);
        if channels.iter().any(|c| c.len() != frames) {
            return Err(ConfigError::InvalidParameter {
                name: "channels",
                reason: "channel lengths differ".to_string(),
            });
        }
        let mut data = Vec::with_capacity(frames * channels.len());
        for k in 0..frames {
            data.extend(channels.iter().map(|c| c[k]));
        }
        Self::new(channels.len(), data)
    }
}

impl BlockSource for MemorySource {
    fn channels(&self) -> usize {
        self.channels
    }

    fn frames(&self) -> u64 {
        (self.data.len() / self.channels) as u64
    }

    fn seek(&mut self, frame: u64) -> u64 {
        self.pos = frame.min(self.frames()) as usize;
        self.pos as u64
    }

    fn read(&mut self, dst: &mut [Sample]) -> usize {
        let total = self.data.len() / self.channels;
        let n = (dst.len() / self.channels).min(total - self.pos);
        let start = self.pos * self.channels;
        dst[..n * self.channels].copy_from_slice(&self.data[start..start + n * self.channels]);
        self.pos += n;
        n
    }
}

/// Presents a source repeated `loop_count` times (0 = forever)
#[derive(Debug, Clone)]
pub struct LoopedSource<S> {
    inner: S,
    inner_frames: u64,
    loop_count: u32,
    /// Position on the looped timeline
    pos: u64,
}

impl<S: BlockSource> LoopedSource<S> {
    pub fn new(mut inner: S, loop_count: u32) -> ConfigResult<Self> {
        let inner_frames = inner.frames();
        if inner_frames == 0 {
            return Err(ConfigError::EmptySource);
        }
        inner.seek(0);
        Ok(Self {
            inner,
            inner_frames,
            loop_count,
            pos: 0,
        })
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: BlockSource> BlockSource for LoopedSource<S> {
    fn channels(&self) -> usize {
        self.inner.channels()
    }

    fn frames(&self) -> u64 {
        if self.loop_count == 0 {
            u64::MAX
        } else {
            self.inner_frames.saturating_mul(self.loop_count as u64)
        }
    }

    fn seek(&mut self, frame: u64) -> u64 {
        let total = self.frames();
        self.pos = frame.min(total);
        if self.pos == total {
            self.inner.seek(self.inner_frames);
        } else {
            self.inner.seek(self.pos % self.inner_frames);
        }
        self.pos
    }

    fn read(&mut self, dst: &mut [Sample]) -> usize {
        let channels = self.inner.channels();
        let wanted = dst.len() / channels;
        let total = self.frames();
        let mut done = 0;
        while done < wanted && self.pos < total {
            let in_loop = self.inner_frames - self.pos % self.inner_frames;
            let n = ((wanted - done) as u64).min(in_loop).min(total - self.pos) as usize;
            let got = self
                .inner
                .read(&mut dst[done * channels..(done + n) * channels]);
            if got == 0 {
                break;
            }
            done += got;
            self.pos += got as u64;
            if self.pos % self.inner_frames == 0 && self.pos < total {
                self.inner.seek(0);
            }
        }
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> MemorySource {
        MemorySource::new(1, (0..frames).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn test_memory_source_interleaves() {
        let mut src =
            MemorySource::from_channels(&[vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]]).unwrap();
        assert_eq!(src.frames(), 3);
        let mut buf = [0.0; 4];
        assert_eq!(src.read(&mut buf), 2);
        assert_eq!(buf, [1.0, -1.0, 2.0, -2.0]);
        assert_eq!(src.read(&mut buf), 1);
        assert_eq!(src.read(&mut buf), 0);
        assert!(MemorySource::new(2, vec![0.0; 3]).is_err());
    }

    #[test]
    fn test_looped_reads_wrap() {
        let mut src = LoopedSource::new(ramp(4), 2).unwrap();
        assert_eq!(src.frames(), 8);
        let mut buf = [0.0; 10];
        assert_eq!(src.read(&mut buf), 8);
        assert_eq!(&buf[..8], &[0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(src.read(&mut buf), 0);
    }

    #[test]
    fn test_looped_seek_clamps_to_end() {
        let mut src = LoopedSource::new(ramp(4), 3).unwrap();
        assert_eq!(src.seek(6), 6);
        let mut buf = [0.0; 1];
        src.read(&mut buf);
        assert_eq!(buf[0], 2.0);
        assert_eq!(src.seek(100), 12);
        assert_eq!(src.read(&mut buf), 0);
    }

    #[test]
    fn test_infinite_loop() {
        let mut src = LoopedSource::new(ramp(3), 0).unwrap();
        src.seek(3_000_001);
        let mut buf = [0.0; 3];
        assert_eq!(src.read(&mut buf), 3);
        assert_eq!(buf, [1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_empty_source_rejected() {
        assert!(matches!(
            LoopedSource::new(ramp(0), 1),
            Err(ConfigError::EmptySource)
        ));
    }
}
