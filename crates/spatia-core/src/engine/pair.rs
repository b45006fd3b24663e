//! Source/receiver pair rendering
//!
//! A [`RenderPair`] takes one mono source signal, delays it by the
//! propagation time to the receiver, attenuates it by distance and hands
//! the result to its [`PanningEncoder`]. Distance and gain are ramped
//! linearly over each block, so a moving source produces Doppler shift
//! instead of clicks. Air absorption is a one-pole low-pass whose
//! coefficient falls with distance. Sources beyond the maximum distance are
//! not rendered.

use crate::buffer::ChannelBuffers;
use crate::config::{EncoderConfig, RenderConfig};
use crate::diagnostics::Diagnostics;
use crate::dsp::{flush_denormal_f32, FractionalDelayLine};
use crate::error::ConfigResult;
use crate::panning::{required_channels, EncoderContext, PanningEncoder};
use crate::types::{Position, Sample};

/// Builds [`RenderPair`]s for one output format
///
/// Lives on the control thread; the pairs it builds are handed to the
/// audio thread through the command queue.
#[derive(Debug, Clone)]
pub struct PairFactory {
    config: RenderConfig,
    context: EncoderContext,
    channels: usize,
}

/// Propagation delay in samples at which the absorption low-pass
/// coefficient has fallen to `1/e`
const AIR_ABSORPTION_SAMPLES: f64 = 7782.0;

impl PairFactory {
    /// Pairs use the encoder selected in `config`
    pub fn new(config: RenderConfig, context: EncoderContext) -> ConfigResult<Self> {
        let channels = required_channels(&config.encoder, &context)?;
        Ok(Self {
            config,
            context,
            channels,
        })
    }

    /// Output channels of every pair built here
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn encoder_config(&self) -> &EncoderConfig {
        &self.config.encoder
    }

    pub fn context(&self) -> &EncoderContext {
        &self.context
    }

    /// Build a pair reading input channel `input`, placed at `position`
    /// relative to the receiver
    pub fn build(
        &self,
        input: usize,
        position: Position,
        diagnostics: &mut Diagnostics,
    ) -> ConfigResult<RenderPair> {
        let encoder = PanningEncoder::configure(
            self.channels,
            &self.config.encoder,
            &self.context,
            diagnostics,
        )?;
        let delay = FractionalDelayLine::for_distance(
            self.config.max_distance,
            self.context.sample_rate,
            self.context.speed_of_sound,
            self.context.sinc_order,
            self.context.oversampling,
        )?;
        let mut pair = RenderPair {
            input,
            position,
            gain: 1.0,
            max_distance: self.config.max_distance as f32,
            distance: 0.0,
            air_gain: 0.0,
            air_scale: self.config.air_absorption.then(|| {
                (self.context.sample_rate
                    / (self.context.speed_of_sound * AIR_ABSORPTION_SAMPLES)) as f32
            }),
            air_coeff: 1.0,
            air_state: 0.0,
            delay,
            encoder,
            scratch: vec![0.0; self.config.block_size],
        };
        // start at rest instead of sweeping in from zero distance
        pair.distance = pair.target_distance();
        pair.air_gain = pair.target_air_gain();
        pair.air_coeff = pair.target_air_coeff();
        log::debug!(
            "Built {} pair for input {} at {:.2} m",
            self.config.encoder.name(),
            input,
            pair.distance
        );
        Ok(pair)
    }
}

/// One source rendered for one receiver
#[derive(Debug)]
pub struct RenderPair {
    input: usize,
    position: Position,
    gain: f32,
    max_distance: f32,
    /// Distance reached at the end of the last block
    distance: f32,
    /// Attenuation reached at the end of the last block
    air_gain: f32,
    /// Absorption per metre, `None` when disabled
    air_scale: Option<f32>,
    /// Input weight of the absorption low-pass (1 = no filtering)
    air_coeff: f32,
    air_state: f32,
    delay: FractionalDelayLine,
    encoder: PanningEncoder,
    scratch: Vec<Sample>,
}

impl RenderPair {
    /// Index of the input signal this pair reads
    pub fn input(&self) -> usize {
        self.input
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Move the source; takes effect over the next block
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Distance attenuation including the user gain
    pub fn air_gain(&self) -> f32 {
        self.air_gain
    }

    pub fn encoder(&self) -> &PanningEncoder {
        &self.encoder
    }

    pub fn channels(&self) -> usize {
        self.encoder.channels()
    }

    fn target_distance(&self) -> f32 {
        (self.position.norm() as f32).min(self.max_distance)
    }

    fn target_air_gain(&self) -> f32 {
        self.gain / self.target_distance().max(1.0)
    }

    fn target_air_coeff(&self) -> f32 {
        self.air_scale
            .map_or(1.0, |scale| (-self.target_distance() * scale).exp())
    }

    /// Whether the source is close enough to be rendered
    pub fn in_range(&self) -> bool {
        self.position.norm() as f32 <= self.max_distance
    }

    /// Render one block of `input` into `outputs` (additive)
    ///
    /// At most `block_size` frames are rendered. Nothing is rendered while
    /// the source is beyond the maximum distance.
    pub fn process(&mut self, input: &[Sample], outputs: &mut ChannelBuffers) {
        let n = input.len().min(self.scratch.len());
        if n == 0 || !self.in_range() {
            return;
        }
        let target_distance = self.target_distance();
        let target_gain = self.target_air_gain();
        let target_coeff = self.target_air_coeff();
        let step = 1.0 / n as f32;
        let d_distance = (target_distance - self.distance) * step;
        let d_gain = (target_gain - self.air_gain) * step;
        let d_coeff = (target_coeff - self.air_coeff) * step;

        let mut distance = self.distance;
        let mut gain = self.air_gain;
        let mut coeff = self.air_coeff;
        let absorb = self.air_scale.is_some();
        for (out, &x) in self.scratch[..n].iter_mut().zip(input) {
            distance += d_distance;
            gain += d_gain;
            let y = gain * self.delay.get_dist_push(distance, x);
            *out = if absorb {
                coeff += d_coeff;
                self.air_state =
                    flush_denormal_f32((1.0 - coeff) * self.air_state + coeff * y);
                self.air_state
            } else {
                y
            };
        }
        self.distance = target_distance;
        self.air_gain = target_gain;
        self.air_coeff = target_coeff;

        self.encoder
            .process(&self.position, &self.scratch[..n], outputs);
    }

    /// Clear delay and ramp state
    pub fn reset(&mut self) {
        self.delay.reset();
        self.encoder.reset();
        self.air_state = 0.0;
        self.air_coeff = self.target_air_coeff();
        self.distance = self.target_distance();
        self.air_gain = self.target_air_gain();
    }
}
