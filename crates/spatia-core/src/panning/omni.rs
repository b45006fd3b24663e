//! Direction independent single-channel encoder

use super::GainRamp;
use crate::buffer::{mix_into, ChannelBuffers, FoaBlock};
use crate::types::{Position, Sample};

#[derive(Debug, Clone)]
pub struct OmniEncoder {
    ramp: GainRamp,
}

impl OmniEncoder {
    pub fn new() -> Self {
        Self {
            ramp: GainRamp::new(1),
        }
    }

    pub fn compute_target(&mut self, _rel: &Position) {
        self.ramp.target_mut()[0] = 1.0;
    }

    pub fn render(&mut self, input: &[Sample], outputs: &mut ChannelBuffers) {
        self.ramp.mix(input, outputs);
    }

    pub fn add_diffuse(&self, foa: &FoaBlock, outputs: &mut ChannelBuffers) {
        mix_into(outputs.channel_mut(0), foa.w(), 1.0);
    }

    pub(super) fn ramp(&self) -> &GainRamp {
        &self.ramp
    }

    pub(super) fn ramp_mut(&mut self) -> &mut GainRamp {
        &mut self.ramp
    }
}

impl Default for OmniEncoder {
    fn default() -> Self {
        Self::new()
    }
}
