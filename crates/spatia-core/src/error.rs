//! Configuration error types
//!
//! Every failure this crate can report happens while configuring: building
//! a speaker geometry, sizing a delay line, binding an encoder to its
//! outputs or opening a stream. Render-time conditions (underruns,
//! denormals) are handled in place and never surface here.

use thiserror::Error;

/// Errors raised while building or configuring a render component
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Not enough speakers for the chosen algorithm
    #[error("{algorithm} requires at least {required} speakers, got {actual}")]
    TooFewChannels {
        algorithm: &'static str,
        required: usize,
        actual: usize,
    },

    /// A 2-D layout contains an elevated speaker
    #[error("Speaker {index} has elevation {elevation_deg:.1} deg, but 2D layouts must be horizontal")]
    ElevatedSpeaker { index: usize, elevation_deg: f64 },

    /// Two adjacent speakers form a singular basis
    #[error("Degenerate speaker pair ({first}, {second}): basis matrix is singular")]
    DegenerateSimplex { first: usize, second: usize },

    /// Two azimuth-adjacent speakers of a 2-D layout leave a gap of
    /// 180 degrees or more
    #[error("Speakers {first} and {second} are {degrees:.1} deg apart, 2D layouts need gaps below 180 deg")]
    SpeakerGap {
        first: usize,
        second: usize,
        degrees: f64,
    },

    /// The speakers of a 3-D layout lie on a plane
    #[error("Speaker layout is flat (not a 3D layout?)")]
    FlatLayout,

    /// The computed triangulation does not cover the sphere
    #[error("Invalid convex hull: {0}")]
    InvalidHull(String),

    /// Delay line capacity must be positive
    #[error("Delay line capacity must be at least one sample")]
    ZeroCapacity,

    /// Requested delay exceeds what the line can hold
    #[error("Delay of {requested} samples exceeds maximum of {max}")]
    DelayOutOfRange { requested: f64, max: usize },

    /// Output channel count does not match the encoder
    #[error("{algorithm} renders {expected} channels, but {actual} outputs were supplied")]
    ChannelMismatch {
        algorithm: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Ambisonic order outside the supported range
    #[error("Ambisonic order {0} not supported (0..=3)")]
    InvalidOrder(u32),

    /// Invalid algorithm parameter
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Stream source does not provide enough channels
    #[error("Stream source has {available} channels, {required} required")]
    StreamChannels { available: usize, required: usize },

    /// Stream source is empty
    #[error("Stream source contains no frames")]
    EmptySource,

    /// Background service thread could not be started
    #[error("Failed to spawn stream service thread: {0}")]
    ServiceSpawn(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
