//! Streaming of source material into the audio thread

mod reader;
mod ring;
mod source;

pub use reader::{AsyncStreamReader, StreamCommand};
pub use ring::{RelocatableRingBuffer, RelocateGuard, INVALID_LOCATION};
pub use source::{BlockSource, LoopedSource, MemorySource};
