//! Panning encoders
//!
//! A [`PanningEncoder`] turns a mono source signal and its position
//! relative to the receiver into per-channel contributions. The set of
//! algorithms is closed, so the encoder is a sum type dispatched with
//! `match` rather than a trait object; the audio thread never makes an
//! indirect call.
//!
//! Per block the caller:
//! 1. calls [`PanningEncoder::compute_target`] with the relative position
//! 2. calls [`PanningEncoder::render`], which ramps from the previous
//!    block's gains to the new targets sample by sample and mixes into the
//!    outputs (additive)
//!
//! Structural changes (channel count, geometry) require building a new
//! encoder via [`PanningEncoder::configure`].

mod ambisonic;
mod cardioid;
mod hann;
mod omni;
mod ramp;
mod speaker;
mod vbap;
mod wfs;

pub use ambisonic::{channel_count as ambisonic_channel_count, AmbisonicEncoder, MAX_ORDER};
pub use cardioid::{CardioidEncoder, ShapedCardioidEncoder, ThresholdCardioidEncoder};
pub use hann::HannEncoder;
pub use omni::OmniEncoder;
pub use ramp::GainRamp;
pub use speaker::{decode_foa, SpeakerPostProc};
pub use vbap::VbapEncoder;
pub use wfs::WfsEncoder;

use std::sync::Arc;

use crate::buffer::{ChannelBuffers, FoaBlock};
use crate::config::{EncoderConfig, RenderConfig};
use crate::diagnostics::Diagnostics;
use crate::error::{ConfigError, ConfigResult};
use crate::geometry::SpeakerArrayGeometry;
use crate::types::{Position, Sample};

/// Environment an encoder is configured in
#[derive(Debug, Clone)]
pub struct EncoderContext {
    pub sample_rate: f64,
    pub speed_of_sound: f64,
    pub sinc_order: u32,
    pub oversampling: u32,
    /// Speaker array, required by speaker-based algorithms
    pub geometry: Option<Arc<SpeakerArrayGeometry>>,
}

impl EncoderContext {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            sample_rate: config.sample_rate as f64,
            speed_of_sound: config.speed_of_sound,
            sinc_order: config.sinc_order,
            oversampling: config.oversampling,
            geometry: None,
        }
    }

    pub fn with_geometry(mut self, geometry: Arc<SpeakerArrayGeometry>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    fn require_geometry(
        &self,
        algorithm: &'static str,
    ) -> ConfigResult<Arc<SpeakerArrayGeometry>> {
        self.geometry.clone().ok_or_else(|| ConfigError::InvalidParameter {
            name: "geometry",
            reason: format!("{} needs a speaker layout", algorithm),
        })
    }
}

/// Number of output channels an algorithm produces in a context
pub fn required_channels(config: &EncoderConfig, ctx: &EncoderContext) -> ConfigResult<usize> {
    match config {
        EncoderConfig::Omni
        | EncoderConfig::Cardioid { .. }
        | EncoderConfig::ShapedCardioid { .. }
        | EncoderConfig::ThresholdCardioid { .. } => Ok(1),
        EncoderConfig::Ambisonic {
            order, horizontal, ..
        } => {
            if *order > MAX_ORDER {
                return Err(ConfigError::InvalidOrder(*order));
            }
            Ok(ambisonic::channel_count(*order, *horizontal))
        }
        EncoderConfig::Hann { .. }
        | EncoderConfig::Vbap2d
        | EncoderConfig::Vbap3d
        | EncoderConfig::Wfs { .. } => Ok(ctx.require_geometry(config.name())?.len()),
    }
}

/// One encoder instance per source/receiver pair
#[derive(Debug, Clone)]
pub enum PanningEncoder {
    Omni(OmniEncoder),
    Cardioid(CardioidEncoder),
    ShapedCardioid(ShapedCardioidEncoder),
    ThresholdCardioid(ThresholdCardioidEncoder),
    Hann(HannEncoder),
    Ambisonic(AmbisonicEncoder),
    Vbap(VbapEncoder),
    Wfs(WfsEncoder),
}

impl PanningEncoder {
    /// Build an encoder for `channels` outputs
    ///
    /// Fails if the channel count does not match what the algorithm
    /// produces, or if the algorithm parameters or geometry are invalid.
    pub fn configure(
        channels: usize,
        config: &EncoderConfig,
        ctx: &EncoderContext,
        diagnostics: &mut Diagnostics,
    ) -> ConfigResult<Self> {
        let expected = required_channels(config, ctx)?;
        if channels != expected {
            return Err(ConfigError::ChannelMismatch {
                algorithm: config.name(),
                expected,
                actual: channels,
            });
        }
        let encoder = match config {
            EncoderConfig::Omni => Self::Omni(OmniEncoder::new()),
            EncoderConfig::Cardioid { a, exponent } => {
                Self::Cardioid(CardioidEncoder::new(*a, *exponent)?)
            }
            EncoderConfig::ShapedCardioid { f6db, fmin } => Self::ShapedCardioid(
                ShapedCardioidEncoder::new(*f6db, *fmin, ctx.sample_rate)?,
            ),
            EncoderConfig::ThresholdCardioid {
                start_deg,
                stop_deg,
            } => Self::ThresholdCardioid(ThresholdCardioidEncoder::new(
                *start_deg, *stop_deg,
            )?),
            EncoderConfig::Hann { wexp } => {
                Self::Hann(HannEncoder::new(ctx.require_geometry("hann")?, *wexp)?)
            }
            EncoderConfig::Ambisonic {
                order,
                horizontal,
                convention,
            } => Self::Ambisonic(AmbisonicEncoder::new(
                *order,
                *horizontal,
                *convention,
            )?),
            EncoderConfig::Vbap2d => {
                Self::Vbap(VbapEncoder::planar(ctx.require_geometry("vbap2d")?)?)
            }
            EncoderConfig::Vbap3d => Self::Vbap(VbapEncoder::spatial(
                ctx.require_geometry("vbap3d")?,
                diagnostics,
            )?),
            EncoderConfig::Wfs { planewave } => Self::Wfs(WfsEncoder::new(
                ctx.require_geometry("wfs")?,
                *planewave,
                ctx.sample_rate,
                ctx.speed_of_sound,
                ctx.sinc_order,
                ctx.oversampling,
            )?),
        };
        log::debug!(
            "Configured {} encoder with {} channels",
            config.name(),
            channels
        );
        Ok(encoder)
    }

    /// Number of output channels
    pub fn channels(&self) -> usize {
        match self {
            Self::Omni(_)
            | Self::Cardioid(_)
            | Self::ShapedCardioid(_)
            | Self::ThresholdCardioid(_) => 1,
            Self::Hann(e) => e.geometry().len(),
            Self::Ambisonic(e) => e.channels(),
            Self::Vbap(e) => e.geometry().len(),
            Self::Wfs(e) => e.geometry().len(),
        }
    }

    /// Speaker array of speaker-based encoders
    pub fn geometry(&self) -> Option<&Arc<SpeakerArrayGeometry>> {
        match self {
            Self::Hann(e) => Some(e.geometry()),
            Self::Vbap(e) => Some(e.geometry()),
            Self::Wfs(e) => Some(e.geometry()),
            _ => None,
        }
    }

    /// Set the per-channel targets from the source position relative to
    /// the receiver (direction and distance)
    #[inline]
    pub fn compute_target(&mut self, rel: &Position) {
        match self {
            Self::Omni(e) => e.compute_target(rel),
            Self::Cardioid(e) => e.compute_target(rel),
            Self::ShapedCardioid(e) => e.compute_target(rel),
            Self::ThresholdCardioid(e) => e.compute_target(rel),
            Self::Hann(e) => e.compute_target(rel),
            Self::Ambisonic(e) => e.compute_target(rel),
            Self::Vbap(e) => e.compute_target(rel),
            Self::Wfs(e) => e.compute_target(rel),
        }
    }

    /// Mix one block of `input` into `outputs`, ramping towards the targets
    ///
    /// `outputs` must have at least [`channels`](Self::channels) channels
    /// and `input.len()` frames.
    #[inline]
    pub fn render(&mut self, input: &[Sample], outputs: &mut ChannelBuffers) {
        debug_assert!(outputs.num_channels() >= self.channels());
        debug_assert!(outputs.frames() >= input.len());
        match self {
            Self::Omni(e) => e.render(input, outputs),
            Self::Cardioid(e) => e.render(input, outputs),
            Self::ShapedCardioid(e) => e.render(input, outputs),
            Self::ThresholdCardioid(e) => e.render(input, outputs),
            Self::Hann(e) => e.render(input, outputs),
            Self::Ambisonic(e) => e.render(input, outputs),
            Self::Vbap(e) => e.render(input, outputs),
            Self::Wfs(e) => e.render(input, outputs),
        }
    }

    /// Compute targets for `rel` and render one block
    pub fn process(&mut self, rel: &Position, input: &[Sample], outputs: &mut ChannelBuffers) {
        self.compute_target(rel);
        self.render(input, outputs);
    }

    /// Add a first-order diffuse field block into `outputs`
    pub fn add_diffuse(&self, foa: &FoaBlock, outputs: &mut ChannelBuffers) {
        match self {
            Self::Omni(e) => e.add_diffuse(foa, outputs),
            Self::Cardioid(e) => e.add_diffuse(foa, outputs),
            Self::ShapedCardioid(e) => e.add_diffuse(foa, outputs),
            Self::ThresholdCardioid(e) => e.add_diffuse(foa, outputs),
            Self::Hann(e) => e.add_diffuse(foa, outputs),
            Self::Ambisonic(e) => e.add_diffuse(foa, outputs),
            Self::Vbap(e) => e.add_diffuse(foa, outputs),
            Self::Wfs(e) => e.add_diffuse(foa, outputs),
        }
    }

    fn ramp(&self) -> Option<&GainRamp> {
        match self {
            Self::Omni(e) => Some(e.ramp()),
            Self::Cardioid(e) => Some(e.ramp()),
            Self::ShapedCardioid(_) => None,
            Self::ThresholdCardioid(e) => Some(e.ramp()),
            Self::Hann(e) => Some(e.ramp()),
            Self::Ambisonic(e) => Some(e.ramp()),
            Self::Vbap(e) => Some(e.ramp()),
            Self::Wfs(e) => Some(e.ramp()),
        }
    }

    /// Gains reached at the end of the last rendered block
    ///
    /// The shaped cardioid reports its filter coefficient instead.
    pub fn current_gains(&self) -> Vec<f32> {
        match (self, self.ramp()) {
            (Self::ShapedCardioid(e), _) => vec![e.current() as f32],
            (_, Some(r)) => r.current().to_vec(),
            _ => Vec::new(),
        }
    }

    /// Targets set by the last [`compute_target`](Self::compute_target)
    pub fn target_gains(&self) -> Vec<f32> {
        match (self, self.ramp()) {
            (Self::ShapedCardioid(e), _) => vec![e.target() as f32],
            (_, Some(r)) => r.target().to_vec(),
            _ => Vec::new(),
        }
    }

    /// Clear ramp and filter state, e.g. when a pair is re-activated
    pub fn reset(&mut self) {
        match self {
            Self::Omni(e) => e.ramp_mut().reset(),
            Self::Cardioid(e) => e.ramp_mut().reset(),
            Self::ShapedCardioid(e) => e.reset(),
            Self::ThresholdCardioid(e) => e.ramp_mut().reset(),
            Self::Hann(e) => e.ramp_mut().reset(),
            Self::Ambisonic(e) => e.ramp_mut().reset(),
            Self::Vbap(e) => e.ramp_mut().reset(),
            Self::Wfs(e) => e.reset(),
        }
    }
}
