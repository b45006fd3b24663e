//! Single-channel directional encoders
//!
//! All variants look along the receiver's front axis (+x) and derive their
//! gain from the cosine of the angle between that axis and the source.

use super::GainRamp;
use crate::buffer::{mix_into, ChannelBuffers, FoaBlock};
use crate::dsp::flush_denormal;
use crate::error::{ConfigError, ConfigResult};
use crate::types::{Position, Sample, DEG2RAD};

/// Lower bound of the shaped cardioid filter coefficient
const MIN_COEFF: f64 = 1e-6;

/// First-order virtual microphone `1 + a (cos θ - 1)`
#[derive(Debug, Clone)]
pub struct CardioidEncoder {
    a: f64,
    exponent: f64,
    ramp: GainRamp,
}

impl CardioidEncoder {
    pub fn new(a: f64, exponent: f64) -> ConfigResult<Self> {
        if !(0.0..=1.0).contains(&a) {
            return Err(ConfigError::InvalidParameter {
                name: "a",
                reason: format!("{} is outside [0, 1]", a),
            });
        }
        if !(exponent > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "exponent",
                reason: format!("{} must be positive", exponent),
            });
        }
        Ok(Self {
            a,
            exponent,
            ramp: GainRamp::new(1),
        })
    }

    /// Directivity gain for a unit direction
    pub fn gain(&self, dir: &Position) -> f64 {
        let g = 1.0 + self.a * (dir.x - 1.0);
        if self.exponent == 1.0 {
            g
        } else {
            g.abs().powf(self.exponent).copysign(g)
        }
    }

    pub fn compute_target(&mut self, rel: &Position) {
        self.ramp.target_mut()[0] = self.gain(&rel.normal()) as f32;
    }

    pub fn render(&mut self, input: &[Sample], outputs: &mut ChannelBuffers) {
        self.ramp.mix(input, outputs);
    }

    pub fn add_diffuse(&self, foa: &FoaBlock, outputs: &mut ChannelBuffers) {
        let out = outputs.channel_mut(0);
        mix_into(out, foa.w(), (std::f64::consts::SQRT_2 * (1.0 - self.a)) as f32);
        mix_into(out, foa.x(), self.a as f32);
    }

    pub(super) fn ramp(&self) -> &GainRamp {
        &self.ramp
    }

    pub(super) fn ramp_mut(&mut self) -> &mut GainRamp {
        &mut self.ramp
    }
}

/// Cardioid whose off-axis attenuation is a one-pole low-pass
///
/// The filter coefficient is `(0.5 - 0.5 cos θ)^wpow`, limited to `wmin`,
/// so frontal sources pass unfiltered, sources at 90 degrees are low-passed
/// at `f6db` and sources from behind at `fmin`.
#[derive(Debug, Clone)]
pub struct ShapedCardioidEncoder {
    wpow: f64,
    wmin: f64,
    /// Current filter coefficient
    w: f64,
    target: f64,
    state: f64,
}

impl ShapedCardioidEncoder {
    pub fn new(f6db: f64, fmin: f64, sample_rate: f64) -> ConfigResult<Self> {
        for (name, value) in [("f6db", f6db), ("fmin", fmin)] {
            if !(value > 0.0 && value < 0.5 * sample_rate) {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("{} Hz is outside (0, fs/2)", value),
                });
            }
        }
        let wpow = (-std::f64::consts::PI * f6db / sample_rate) / 0.5f64.ln();
        let wmin = (-std::f64::consts::PI * fmin / sample_rate).exp();
        Ok(Self {
            wpow,
            wmin,
            w: 0.0,
            target: 0.0,
            state: 0.0,
        })
    }

    /// Filter coefficient for a unit direction
    pub fn coefficient(&self, dir: &Position) -> f64 {
        let w = (0.5 - 0.5 * dir.x).max(0.0).powf(self.wpow);
        let w = w.min(self.wmin);
        if w > MIN_COEFF {
            w
        } else {
            MIN_COEFF
        }
    }

    pub fn compute_target(&mut self, rel: &Position) {
        self.target = self.coefficient(&rel.normal());
    }

    pub fn render(&mut self, input: &[Sample], outputs: &mut ChannelBuffers) {
        let dw = (self.target - self.w) / input.len().max(1) as f64;
        let mut w = self.w;
        let mut state = self.state;
        for (o, &x) in outputs.channel_mut(0).iter_mut().zip(input) {
            w += dw;
            state = flush_denormal(x as f64 * (1.0 - w) + state * w);
            *o += state as Sample;
        }
        self.state = state;
        self.w = self.target;
    }

    pub fn add_diffuse(&self, foa: &FoaBlock, outputs: &mut ChannelBuffers) {
        mix_into(outputs.channel_mut(0), foa.w(), 1.0);
    }

    /// Current filter coefficient
    pub fn current(&self) -> f64 {
        self.w
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn reset(&mut self) {
        self.w = 0.0;
        self.target = 0.0;
        self.state = 0.0;
    }
}

/// Linear attenuation between a start and a stop angle off axis
#[derive(Debug, Clone)]
pub struct ThresholdCardioidEncoder {
    cos_start: f64,
    cos_stop: f64,
    ramp: GainRamp,
}

impl ThresholdCardioidEncoder {
    pub fn new(start_deg: f64, stop_deg: f64) -> ConfigResult<Self> {
        if !(0.0..=180.0).contains(&start_deg)
            || !(0.0..=180.0).contains(&stop_deg)
            || stop_deg <= start_deg
        {
            return Err(ConfigError::InvalidParameter {
                name: "stop_deg",
                reason: format!(
                    "need 0 <= start ({}) < stop ({}) <= 180 degrees",
                    start_deg, stop_deg
                ),
            });
        }
        Ok(Self {
            cos_start: (start_deg * DEG2RAD).cos(),
            cos_stop: (stop_deg * DEG2RAD).cos(),
            ramp: GainRamp::new(1),
        })
    }

    pub fn gain(&self, dir: &Position) -> f64 {
        ((dir.x - self.cos_stop) / (self.cos_start - self.cos_stop)).clamp(0.0, 1.0)
    }

    pub fn compute_target(&mut self, rel: &Position) {
        self.ramp.target_mut()[0] = self.gain(&rel.normal()) as f32;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardioid_pattern() {
        let enc = CardioidEncoder::new(0.5, 1.0).unwrap();
        assert!((enc.gain(&Position::FRONT) - 1.0).abs() < 1e-12);
        assert!((enc.gain(&Position::new(0.0, 1.0, 0.0)) - 0.5).abs() < 1e-12);
        assert!(enc.gain(&Position::new(-1.0, 0.0, 0.0)).abs() < 1e-12);

        let eight = CardioidEncoder::new(1.0, 1.0).unwrap();
        assert!((eight.gain(&Position::new(-1.0, 0.0, 0.0)) + 1.0).abs() < 1e-12);

        assert!(CardioidEncoder::new(1.5, 1.0).is_err());
    }

    #[test]
    fn test_cardioid_exponent_keeps_sign() {
        let enc = CardioidEncoder::new(1.0, 2.0).unwrap();
        let g = enc.gain(&Position::from_sphere_deg(1.0, 120.0, 0.0));
        assert!((g + 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_shaped_cardioid_coefficients() {
        let fs = 48000.0;
        let enc = ShapedCardioidEncoder::new(1000.0, 60.0, fs).unwrap();
        assert_eq!(enc.coefficient(&Position::FRONT), MIN_COEFF);

        let side = enc.coefficient(&Position::new(0.0, 1.0, 0.0));
        let expected = (-std::f64::consts::PI * 1000.0 / fs).exp();
        assert!((side - expected).abs() < 1e-9);

        let back = enc.coefficient(&Position::new(-1.0, 0.0, 0.0));
        assert!((back - (-std::f64::consts::PI * 60.0 / fs).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_shaped_cardioid_front_passes_signal() {
        let mut enc = ShapedCardioidEncoder::new(1000.0, 60.0, 48000.0).unwrap();
        let input = vec![1.0; 64];
        let mut out = ChannelBuffers::new(1, 64);
        enc.compute_target(&Position::FRONT);
        enc.render(&input, &mut out);
        assert_eq!(enc.current(), enc.target());
        assert!((out.channel(0)[63] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_shaped_cardioid_flushes_denormals() {
        let mut enc = ShapedCardioidEncoder::new(1000.0, 60.0, 48000.0).unwrap();
        let mut out = ChannelBuffers::new(1, 256);
        enc.compute_target(&Position::new(-1.0, 0.0, 0.0));
        let mut impulse = vec![0.0; 256];
        impulse[0] = 1e-30;
        enc.render(&impulse, &mut out);
        for _ in 0..1000 {
            enc.render(&[0.0; 256], &mut out);
        }
        assert_eq!(enc.state, 0.0);
    }

    #[test]
    fn test_threshold_ramp() {
        let enc = ThresholdCardioidEncoder::new(30.0, 90.0).unwrap();
        assert_eq!(enc.gain(&Position::FRONT), 1.0);
        assert_eq!(enc.gain(&Position::from_sphere_deg(1.0, 20.0, 0.0)), 1.0);
        assert_eq!(enc.gain(&Position::from_sphere_deg(1.0, 120.0, 0.0)), 0.0);
        let mid = enc.gain(&Position::from_sphere_deg(1.0, 60.0, 0.0));
        assert!((mid - 0.5 / (30f64.to_radians().cos())).abs() < 1e-9);

        assert!(ThresholdCardioidEncoder::new(90.0, 30.0).is_err());
    }
}
