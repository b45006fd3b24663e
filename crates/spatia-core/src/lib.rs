//! Spatia Core - real-time spatial audio rendering
//!
//! Per audio block and per source/receiver pair the renderer computes a
//! propagation delay (fractional, sinc interpolated) and a set of output
//! gains (omni, cardioids, ambisonics, VBAP, WFS), and applies both with
//! per-sample ramps. Source material can be streamed from a background
//! thread through a relocatable ring buffer.

pub mod buffer;
pub mod config;
pub mod diagnostics;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod panning;
pub mod stream;
pub mod types;

pub use diagnostics::Diagnostics;
pub use error::{ConfigError, ConfigResult};
pub use types::*;
