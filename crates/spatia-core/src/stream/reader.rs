//! Background-filled stream reader
//!
//! [`AsyncStreamReader`] places a [`BlockSource`] on the session timeline
//! and keeps a [`RelocatableRingBuffer`] filled from a service thread. The
//! audio thread pulls blocks with [`AsyncStreamReader::request_data`],
//! which never blocks: missing data becomes silence and is counted as an
//! xrun.
//!
//! ```text
//! ┌──────────────┐  request_data   ┌──────────────────┐   write   ┌───────────────┐
//! │ Audio thread │ ──────────────► │ RelocatableRing  │ ◄──────── │ stream-reader │
//! │              │   set_locate    │     Buffer       │  relocate │   (service)   │
//! └──────────────┘                 └──────────────────┘           └───────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use super::ring::RelocatableRingBuffer;
use super::source::{BlockSource, LoopedSource};
use crate::config::StreamConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::types::Sample;

/// Commands for the service thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCommand {
    Shutdown,
}

/// Where and how the source appears on the session timeline
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    /// First source channel delivered
    channel_offset: usize,
    /// Timeline frame of the first source frame
    first_frame: i64,
    /// One past the last timeline frame with material
    end_frame: i64,
    gain: f32,
}

/// State owned by the service thread while it runs
struct StreamService {
    ring: Arc<RelocatableRingBuffer>,
    source: LoopedSource<Box<dyn BlockSource>>,
    placement: Placement,
    /// Timeline frame of the next frame to write
    write_location: i64,
    /// Position of `source`, if known
    source_pos: Option<u64>,
    fragment: usize,
    /// Raw interleaved source frames
    source_buf: Vec<Sample>,
    /// Frames produced but not yet accepted by the ring
    pending: Vec<Sample>,
    pending_frames: usize,
    pending_offset: usize,
}

impl StreamService {
    /// One iteration of the service loop; returns frames written
    fn step(&mut self) -> usize {
        if self.ring.relocation_requested() {
            self.relocate();
            return 0;
        }
        self.fill()
    }

    fn relocate(&mut self) {
        let guard = self.ring.lock_relocate();
        if let Some(target) = guard.target() {
            log::debug!("stream relocate to frame {}", target);
            self.write_location = target;
            self.pending_frames = 0;
            self.pending_offset = 0;
            if let Some(frame) = self.source_frame(target) {
                self.source_pos = Some(self.source.seek(frame));
            }
        }
        guard.unlock();
    }

    /// Source frame for a timeline position inside the placement
    fn source_frame(&self, location: i64) -> Option<u64> {
        let p = self.placement;
        (location >= p.first_frame && location < p.end_frame)
            .then(|| (location - p.first_frame) as u64)
    }

    fn fill(&mut self) -> usize {
        let channels = self.ring.channels();
        if self.pending_frames == 0 {
            let n = self.ring.write_space().min(self.fragment);
            if n == 0 {
                return 0;
            }
            self.produce(n);
            self.pending_frames = n;
            self.pending_offset = 0;
        }
        let written = self.ring.write(
            &self.pending[self.pending_offset * channels..self.pending_frames * channels],
        );
        self.pending_offset += written;
        if self.pending_offset == self.pending_frames {
            self.pending_frames = 0;
        }
        written
    }

    /// Render `n` timeline frames into `pending`
    fn produce(&mut self, n: usize) {
        let channels = self.ring.channels();
        let src_channels = self.source.channels();
        let p = self.placement;
        self.pending[..n * channels].fill(0.0);

        let mut done = 0;
        while done < n {
            let location = self.write_location + done as i64;
            if location < p.first_frame {
                done += ((p.first_frame - location) as usize).min(n - done);
                continue;
            }
            let Some(frame) = self.source_frame(location) else {
                break;
            };
            if self.source_pos != Some(frame) {
                self.source_pos = Some(self.source.seek(frame));
            }
            let len = (n - done).min(p.end_frame.saturating_sub(location) as usize);
            let got = self.source.read(&mut self.source_buf[..len * src_channels]);
            if got == 0 {
                break;
            }
            for k in 0..got {
                let src = &self.source_buf[k * src_channels + p.channel_offset..];
                let dst = &mut self.pending[(done + k) * channels..(done + k + 1) * channels];
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = p.gain * *s;
                }
            }
            self.source_pos = Some(frame + got as u64);
            done += got;
        }
        self.write_location += n as i64;
    }

    fn run(mut self, command_rx: Receiver<StreamCommand>, poll: Duration) -> Self {
        log::info!("Stream reader service started");
        loop {
            match command_rx.try_recv() {
                Ok(StreamCommand::Shutdown) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }
            let relocating = self.ring.relocation_requested();
            if self.step() == 0 && !relocating {
                match command_rx.recv_timeout(poll) {
                    Ok(StreamCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }
        }
        log::info!("Stream reader service stopped");
        self
    }
}

/// Handle to the running service thread
struct ServiceHandle {
    command_tx: Sender<StreamCommand>,
    thread_handle: Option<thread::JoinHandle<StreamService>>,
}

/// Streams a source from a background thread into the audio thread
pub struct AsyncStreamReader {
    channels: usize,
    config: StreamConfig,
    ring: Arc<RelocatableRingBuffer>,
    /// Service state while stopped
    idle: Option<StreamService>,
    handle: Option<ServiceHandle>,
    /// Interleaved scratch for one read from the ring
    scratch: Vec<Sample>,
    /// Set while waiting for a relocation we requested
    seeking: bool,
    xruns: AtomicU64,
}

impl AsyncStreamReader {
    /// Create a reader delivering `channels` channels
    pub fn new(channels: usize, config: StreamConfig) -> ConfigResult<Self> {
        let ring = Arc::new(RelocatableRingBuffer::new(config.buffer_frames, channels)?);
        if config.fragment_frames == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "fragment_frames",
                reason: "must be positive".to_string(),
            });
        }
        Ok(Self {
            channels,
            scratch: vec![0.0; config.fragment_frames * channels],
            config,
            ring,
            idle: None,
            handle: None,
            seeking: false,
            xruns: AtomicU64::new(0),
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn ring(&self) -> &Arc<RelocatableRingBuffer> {
        &self.ring
    }

    /// Place `source` on the timeline
    ///
    /// Source channels `channel_offset..channel_offset + channels()` are
    /// delivered (the offset is reduced if the source has too few channels
    /// after it). Frame 0 of the source appears at `first_frame`; it is
    /// repeated `loop_count` times (0 = forever) and scaled by `gain`.
    /// A running service is restarted on the new source.
    pub fn open(
        &mut self,
        source: Box<dyn BlockSource>,
        channel_offset: usize,
        first_frame: i64,
        gain: f32,
        loop_count: u32,
    ) -> ConfigResult<()> {
        let available = source.channels();
        if available < self.channels {
            return Err(ConfigError::StreamChannels {
                available,
                required: self.channels,
            });
        }
        let channel_offset = channel_offset.min(available - self.channels);
        let source = LoopedSource::new(source, loop_count)?;
        let end_frame = match source.frames() {
            u64::MAX => i64::MAX,
            frames => first_frame.saturating_add(frames.min(i64::MAX as u64) as i64),
        };

        let was_running = self.is_running();
        self.stop_service();

        let fragment = self.config.fragment_frames;
        self.idle = Some(StreamService {
            ring: Arc::clone(&self.ring),
            source,
            placement: Placement {
                channel_offset,
                first_frame,
                end_frame,
                gain,
            },
            write_location: 0,
            source_pos: None,
            fragment,
            source_buf: vec![0.0; fragment * available],
            pending: vec![0.0; fragment * self.channels],
            pending_frames: 0,
            pending_offset: 0,
        });
        // restart the timeline at the consumer's position
        self.ring.set_locate(self.ring.current_location());
        self.seeking = true;
        log::info!(
            "Stream opened: {} of {} channels from {}, first frame {}, loops {}",
            self.channels,
            available,
            channel_offset,
            first_frame,
            loop_count
        );

        if was_running {
            self.start_service()?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .and_then(|h| h.thread_handle.as_ref())
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Spawn the service thread
    pub fn start_service(&mut self) -> ConfigResult<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        let Some(service) = self.idle.take() else {
            return Err(ConfigError::EmptySource);
        };
        let (command_tx, command_rx) = crossbeam::channel::unbounded();
        let poll = self.config.poll_interval();
        let thread_handle = thread::Builder::new()
            .name("stream-reader".into())
            .spawn(move || service.run(command_rx, poll))
            .map_err(|e| {
                log::error!("Failed to spawn stream reader: {}", e);
                ConfigError::ServiceSpawn(e.to_string())
            })?;
        self.handle = Some(ServiceHandle {
            command_tx,
            thread_handle: Some(thread_handle),
        });
        Ok(())
    }

    /// Stop and join the service thread
    pub fn stop_service(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        let _ = handle.command_tx.send(StreamCommand::Shutdown);
        if let Some(thread) = handle.thread_handle.take() {
            match thread.join() {
                Ok(service) => self.idle = Some(service),
                Err(_) => log::error!("Stream reader service panicked"),
            }
        }
    }

    /// Fill `buffers` with `frames` frames starting at timeline `position`
    ///
    /// Returns the number of frames taken from the stream; the rest of each
    /// buffer is silence. Never blocks. A position that does not continue
    /// the previous request asks the service to relocate.
    pub fn request_data(
        &mut self,
        position: i64,
        frames: usize,
        buffers: &mut [&mut [Sample]],
    ) -> usize {
        debug_assert_eq!(buffers.len(), self.channels);
        for buf in buffers.iter_mut() {
            buf[..frames].fill(0.0);
        }
        if self.ring.relocation_requested() {
            return 0;
        }
        let current = self.ring.current_location();
        if position > current {
            let skip = (position - current) as usize;
            if skip <= self.ring.read_space() {
                self.ring.read_skip(skip);
            } else if !self.seeking || skip > self.config.fragment_frames {
                self.locate(position + frames as i64);
                return 0;
            }
        } else if position < current {
            // still waiting for the timeline to reach a relocation target
            if !(self.seeking && current - position <= self.seek_lead() as i64) {
                self.locate(position + frames as i64);
            }
            return 0;
        }
        if self.ring.current_location() != position {
            return 0;
        }
        self.seeking = false;

        let channels = self.channels;
        let mut done = 0;
        while done < frames {
            let chunk = (frames - done).min(self.scratch.len() / channels);
            let got = self.ring.read(&mut self.scratch[..chunk * channels]);
            for k in 0..got {
                for (ch, buf) in buffers.iter_mut().enumerate() {
                    buf[done + k] = self.scratch[k * channels + ch];
                }
            }
            done += got;
            if got < chunk {
                break;
            }
        }
        if done < frames {
            self.xruns.fetch_add(1, Ordering::Relaxed);
        }
        done
    }

    fn seek_lead(&self) -> usize {
        self.config.fragment_frames
    }

    fn locate(&mut self, location: i64) {
        self.ring.set_locate(location);
        self.seeking = true;
    }

    /// Number of short reads since the last call
    pub fn take_xruns(&self) -> u64 {
        self.xruns.swap(0, Ordering::Relaxed)
    }

    /// Run one service iteration on the calling thread (service stopped)
    #[cfg(test)]
    fn step_idle(&mut self) -> usize {
        self.idle.as_mut().map_or(0, StreamService::step)
    }
}

impl Drop for AsyncStreamReader {
    fn drop(&mut self) {
        self.stop_service();
    }
}
