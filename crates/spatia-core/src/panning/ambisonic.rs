//! Ambisonic encoding, orders 0 to 3
//!
//! Two conventions are supported:
//! - FuMa: channels `w x y z r s t u v k l m n o p q`, `W` at -3 dB
//! - ACN/SN3D: channels in ACN order, Schmidt semi-normalised, `W` at unity
//!
//! Horizontal-only encoders keep the `2N+1` circular harmonics
//! (`|m| == n`) of the full set, in the same relative order, and depend on
//! azimuth only: an elevated source is encoded at its projection onto the
//! horizontal plane.

use super::GainRamp;
use crate::buffer::{mix_into, ChannelBuffers, FoaBlock};
use crate::config::AmbisonicConvention;
use crate::error::{ConfigError, ConfigResult};
use crate::types::{Position, Sample, MIN3DB};

/// Highest supported order
pub const MAX_ORDER: u32 = 3;

const FUMA_LABELS: [&str; 16] = [
    "w", "x", "y", "z", "r", "s", "t", "u", "v", "k", "l", "m", "n", "o", "p", "q",
];

/// Horizontal components in FuMa order: w x y | u v | p q
const FUMA_HORIZONTAL: [usize; 7] = [0, 1, 2, 7, 8, 14, 15];

/// Horizontal components in ACN order: 0 | 1 3 | 4 8 | 9 15
const ACN_HORIZONTAL: [usize; 7] = [0, 1, 3, 4, 8, 9, 15];

/// Number of channels for an order and dimensionality
pub fn channel_count(order: u32, horizontal: bool) -> usize {
    let n = order as usize;
    if horizontal {
        2 * n + 1
    } else {
        (n + 1) * (n + 1)
    }
}

/// FuMa weighted harmonics up to third order for a unit direction
fn fuma_basis(d: &Position) -> [f64; 16] {
    let (x, y, z) = (d.x, d.y, d.z);
    let (x2, y2, z2) = (x * x, y * y, z * z);
    let u = x2 - y2;
    let v = 2.0 * x * y;
    [
        MIN3DB as f64,
        x,
        y,
        z,
        0.5 * (3.0 * z2 - 1.0),
        2.0 * z * x,
        2.0 * z * y,
        u,
        v,
        0.5 * z * (5.0 * z2 - 3.0),
        0.726184 * (5.0 * z2 - 1.0) * x,
        0.726184 * (5.0 * z2 - 1.0) * y,
        2.598076 * z * u,
        2.598076 * z * v,
        (x2 - 3.0 * y2) * x,
        (3.0 * x2 - y2) * y,
    ]
}

/// SN3D real spherical harmonics up to third order in ACN order
fn acn_sn3d_basis(d: &Position) -> [f64; 16] {
    let (x, y, z) = (d.x, d.y, d.z);
    let (x2, y2, z2) = (x * x, y * y, z * z);
    let s3 = 3f64.sqrt();
    let s15 = 15f64.sqrt();
    let s58 = (5.0f64 / 8.0).sqrt();
    let s38 = (3.0f64 / 8.0).sqrt();
    [
        1.0,
        y,
        z,
        x,
        s3 * x * y,
        s3 * y * z,
        0.5 * (3.0 * z2 - 1.0),
        s3 * x * z,
        0.5 * s3 * (x2 - y2),
        s58 * y * (3.0 * x2 - y2),
        s15 * x * y * z,
        s38 * y * (5.0 * z2 - 1.0),
        0.5 * z * (5.0 * z2 - 3.0),
        s38 * x * (5.0 * z2 - 1.0),
        0.5 * s15 * z * (x2 - y2),
        s58 * x * (x2 - 3.0 * y2),
    ]
}

#[derive(Debug, Clone)]
pub struct AmbisonicEncoder {
    order: u32,
    horizontal: bool,
    convention: AmbisonicConvention,
    /// Index into the full 16-entry basis for each output channel
    components: Vec<usize>,
    ramp: GainRamp,
}

impl AmbisonicEncoder {
    pub fn new(
        order: u32,
        horizontal: bool,
        convention: AmbisonicConvention,
    ) -> ConfigResult<Self> {
        if order > MAX_ORDER {
            return Err(ConfigError::InvalidOrder(order));
        }
        let count = channel_count(order, horizontal);
        let components: Vec<usize> = if horizontal {
            match convention {
                AmbisonicConvention::Fuma => FUMA_HORIZONTAL[..count].to_vec(),
                AmbisonicConvention::AcnSn3d => ACN_HORIZONTAL[..count].to_vec(),
            }
        } else {
            (0..count).collect()
        };
        Ok(Self {
            order,
            horizontal,
            convention,
            ramp: GainRamp::new(components.len()),
            components,
        })
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn is_horizontal(&self) -> bool {
        self.horizontal
    }

    pub fn convention(&self) -> AmbisonicConvention {
        self.convention
    }

    pub fn channels(&self) -> usize {
        self.components.len()
    }

    /// Channel name: FuMa letter or ACN index
    pub fn channel_label(&self, channel: usize) -> String {
        let c = self.components[channel];
        match self.convention {
            AmbisonicConvention::Fuma => FUMA_LABELS[c].to_string(),
            AmbisonicConvention::AcnSn3d => format!("acn{}", c),
        }
    }

    pub fn compute_target(&mut self, rel: &Position) {
        let dir = if self.horizontal {
            Position::from_sphere(1.0, rel.azim(), 0.0)
        } else {
            rel.normal()
        };
        let basis = match self.convention {
            AmbisonicConvention::Fuma => fuma_basis(&dir),
            AmbisonicConvention::AcnSn3d => acn_sn3d_basis(&dir),
        };
        for (t, &c) in self.ramp.target_mut().iter_mut().zip(&self.components) {
            *t = basis[c] as f32;
        }
    }

    pub fn render(&mut self, input: &[Sample], outputs: &mut ChannelBuffers) {
        self.ramp.mix(input, outputs);
    }

    /// Add a FuMa first-order diffuse field into the matching channels
    pub fn add_diffuse(&self, foa: &FoaBlock, outputs: &mut ChannelBuffers) {
        for (k, &c) in self.components.iter().enumerate() {
            let out = outputs.channel_mut(k);
            match (self.convention, c) {
                (AmbisonicConvention::Fuma, 0) => mix_into(out, foa.w(), 1.0),
                (AmbisonicConvention::Fuma, 1) => mix_into(out, foa.x(), 1.0),
                (AmbisonicConvention::Fuma, 2) => mix_into(out, foa.y(), 1.0),
                (AmbisonicConvention::Fuma, 3) => mix_into(out, foa.z(), 1.0),
                (AmbisonicConvention::AcnSn3d, 0) => {
                    mix_into(out, foa.w(), std::f32::consts::SQRT_2)
                }
                (AmbisonicConvention::AcnSn3d, 1) => mix_into(out, foa.y(), 1.0),
                (AmbisonicConvention::AcnSn3d, 2) => mix_into(out, foa.z(), 1.0),
                (AmbisonicConvention::AcnSn3d, 3) => mix_into(out, foa.x(), 1.0),
                _ => {}
            }
        }
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
    use crate::buffer::FoaChannel;

    #[test]
    fn test_channel_counts_and_labels() {
        assert_eq!(channel_count(0, false), 1);
        assert_eq!(channel_count(3, false), 16);
        assert_eq!(channel_count(3, true), 7);

        let enc = AmbisonicEncoder::new(2, true, AmbisonicConvention::Fuma).unwrap();
        let labels: Vec<String> = (0..enc.channels()).map(|k| enc.channel_label(k)).collect();
        assert_eq!(labels, vec!["w", "x", "y", "u", "v"]);

        let enc = AmbisonicEncoder::new(1, true, AmbisonicConvention::AcnSn3d).unwrap();
        assert_eq!(enc.channel_label(2), "acn3");

        assert_eq!(
            AmbisonicEncoder::new(4, false, AmbisonicConvention::Fuma).unwrap_err(),
            ConfigError::InvalidOrder(4)
        );
    }

    #[test]
    fn test_w_is_direction_independent() {
        for convention in [AmbisonicConvention::Fuma, AmbisonicConvention::AcnSn3d] {
            for order in 0..=MAX_ORDER {
                let mut enc = AmbisonicEncoder::new(order, false, convention).unwrap();
                let expected = match convention {
                    AmbisonicConvention::Fuma => MIN3DB,
                    AmbisonicConvention::AcnSn3d => 1.0,
                };
                for (az, el) in [(0.0, 0.0), (90.0, 10.0), (-135.0, -45.0), (10.0, 90.0)] {
                    enc.compute_target(&Position::from_sphere_deg(3.0, az, el));
                    assert_eq!(enc.ramp().target()[0], expected);
                }
            }
        }
    }

    #[test]
    fn test_first_order_directions() {
        let mut fuma = AmbisonicEncoder::new(1, false, AmbisonicConvention::Fuma).unwrap();
        fuma.compute_target(&Position::new(0.0, 2.0, 0.0));
        let t = fuma.ramp().target();
        assert!(t[1].abs() < 1e-7 && (t[2] - 1.0).abs() < 1e-7 && t[3].abs() < 1e-7);

        let mut acn = AmbisonicEncoder::new(1, false, AmbisonicConvention::AcnSn3d).unwrap();
        acn.compute_target(&Position::new(0.0, 0.0, 5.0));
        let t = acn.ramp().target();
        assert!((t[2] - 1.0).abs() < 1e-7);
        assert!(t[1].abs() < 1e-7 && t[3].abs() < 1e-7);
    }

    #[test]
    fn test_sn3d_sectoral_values_on_axis() {
        let mut enc = AmbisonicEncoder::new(3, true, AmbisonicConvention::AcnSn3d).unwrap();
        enc.compute_target(&Position::FRONT);
        let t = enc.ramp().target().to_vec();
        // cos(m * 0) terms: acn 3, 8, 15
        assert!((t[2] - 1.0).abs() < 1e-6);
        assert!((t[4] - 0.5 * 3f32.sqrt()).abs() < 1e-6);
        assert!((t[6] - (5.0f32 / 8.0).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_horizontal_ignores_elevation() {
        let mut enc = AmbisonicEncoder::new(3, true, AmbisonicConvention::Fuma).unwrap();
        enc.compute_target(&Position::from_sphere_deg(2.0, 0.0, 60.0));
        let expected = [MIN3DB, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        for (t, e) in enc.ramp().target().iter().zip(expected) {
            assert!((t - e).abs() < 1e-6, "{:?}", enc.ramp().target());
        }

        for convention in [AmbisonicConvention::Fuma, AmbisonicConvention::AcnSn3d] {
            let mut enc = AmbisonicEncoder::new(3, true, convention).unwrap();
            for az in [-150.0, -20.0, 35.0, 110.0] {
                enc.compute_target(&Position::from_sphere_deg(1.0, az, 0.0));
                let flat = enc.ramp().target().to_vec();
                for el in [-70.0, 25.0, 80.0] {
                    enc.compute_target(&Position::from_sphere_deg(4.0, az, el));
                    for (a, b) in enc.ramp().target().iter().zip(&flat) {
                        assert!((a - b).abs() < 1e-5, "az {} el {}", az, el);
                    }
                }
            }
        }
    }

    #[test]
    fn test_diffuse_acn_mapping() {
        let enc = AmbisonicEncoder::new(1, false, AmbisonicConvention::AcnSn3d).unwrap();
        let mut foa = FoaBlock::new(4);
        foa.get_mut(FoaChannel::W).fill(1.0);
        foa.get_mut(FoaChannel::X).fill(2.0);
        foa.get_mut(FoaChannel::Y).fill(3.0);
        foa.get_mut(FoaChannel::Z).fill(4.0);

        let mut out = ChannelBuffers::new(4, 4);
        enc.add_diffuse(&foa, &mut out);
        assert!((out.channel(0)[0] - std::f32::consts::SQRT_2).abs() < 1e-6);
        assert_eq!(out.channel(1)[0], 3.0);
        assert_eq!(out.channel(2)[0], 4.0);
        assert_eq!(out.channel(3)[0], 2.0);
    }
}
