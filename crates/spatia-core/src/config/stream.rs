//! Streaming configuration

use serde::{Deserialize, Serialize};

/// Parameters of a streamed source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Ring buffer length in frames
    /// Default: 32768
    pub buffer_frames: usize,

    /// Frames pulled from the data source per service iteration
    /// Default: 4096
    pub fragment_frames: usize,

    /// Sleep time of the service thread when there is nothing to do
    /// Default: 2 ms
    pub poll_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_frames: 32768,
            fragment_frames: 4096,
            poll_interval_ms: 2,
        }
    }
}

impl StreamConfig {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}
