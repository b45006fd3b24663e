//! Per-block linear gain interpolation

use crate::buffer::ChannelBuffers;
use crate::types::Sample;

/// Current and target gains of one source/receiver pair
///
/// Within a block the gain moves by `(target - current) / frames` per
/// sample. At the end of every block `current` is set to `target` exactly,
/// so a target held for a full block is reached without rounding drift.
#[derive(Debug, Clone)]
pub struct GainRamp {
    current: Vec<f32>,
    target: Vec<f32>,
}

impl GainRamp {
    /// Create a ramp with all gains at zero
    pub fn new(channels: usize) -> Self {
        Self {
            current: vec![0.0; channels],
            target: vec![0.0; channels],
        }
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.current.len()
    }

    pub fn current(&self) -> &[f32] {
        &self.current
    }

    pub fn target(&self) -> &[f32] {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut [f32] {
        &mut self.target
    }

    /// Jump to the target without interpolation
    pub fn snap(&mut self) {
        self.current.copy_from_slice(&self.target);
    }

    /// Reset current and target to zero
    pub fn reset(&mut self) {
        self.current.fill(0.0);
        self.target.fill(0.0);
    }

    /// Per-sample increment for channel `k` over a block of `frames`
    #[inline]
    pub fn step(&self, k: usize, frames: usize) -> f32 {
        (self.target[k] - self.current[k]) / frames.max(1) as f32
    }

    /// Mix `input` into the first `channels()` outputs with ramped gains
    ///
    /// Additive: existing output content is kept.
    pub fn mix(&mut self, input: &[Sample], outputs: &mut ChannelBuffers) {
        let frames = input.len();
        for k in 0..self.current.len() {
            let dg = self.step(k, frames);
            let mut g = self.current[k];
            let out = outputs.channel_mut(k);
            for (o, &x) in out.iter_mut().zip(input) {
                g += dg;
                *o += g * x;
            }
        }
        self.snap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_reaches_target_exactly() {
        let mut ramp = GainRamp::new(2);
        ramp.target_mut().copy_from_slice(&[0.3, 1.0]);

        let input = vec![1.0; 7];
        let mut out = ChannelBuffers::new(2, 7);
        ramp.mix(&input, &mut out);

        assert_eq!(ramp.current(), &[0.3, 1.0]);
        assert!((out.channel(1)[6] - 1.0).abs() < 1e-6);
        assert!((out.channel(1)[0] - 1.0 / 7.0).abs() < 1e-6);

        // steady target: constant gain across the next block
        out.fill_silence();
        ramp.mix(&input, &mut out);
        assert!(out.channel(0).iter().all(|&s| (s - 0.3).abs() < 1e-7));
    }

    #[test]
    fn test_mix_is_additive() {
        let mut ramp = GainRamp::new(1);
        ramp.target_mut()[0] = 1.0;
        ramp.snap();

        let mut out = ChannelBuffers::new(1, 4);
        out.channel_mut(0).fill(0.5);
        ramp.mix(&[1.0, 1.0, 1.0, 1.0], &mut out);
        assert_eq!(out.channel(0), &[1.5, 1.5, 1.5, 1.5]);
    }
}
