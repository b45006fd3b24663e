//! Hann-window panning over a horizontal speaker ring

use std::sync::Arc;

use super::speaker::decode_foa;
use super::GainRamp;
use crate::buffer::{ChannelBuffers, FoaBlock};
use crate::error::{ConfigError, ConfigResult};
use crate::geometry::SpeakerArrayGeometry;
use crate::types::{Position, Sample};

/// Each speaker gets `(0.5 + 0.5 cos(N/2 * Δaz))^wexp` inside its main lobe
/// and zero outside, where `Δaz` is the azimuth difference to the source.
#[derive(Debug, Clone)]
pub struct HannEncoder {
    geometry: Arc<SpeakerArrayGeometry>,
    wexp: f64,
    ramp: GainRamp,
}

impl HannEncoder {
    pub fn new(geometry: Arc<SpeakerArrayGeometry>, wexp: f64) -> ConfigResult<Self> {
        if !(wexp > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "wexp",
                reason: format!("{} must be positive", wexp),
            });
        }
        let ramp = GainRamp::new(geometry.len());
        Ok(Self {
            geometry,
            wexp,
            ramp,
        })
    }

    pub fn geometry(&self) -> &Arc<SpeakerArrayGeometry> {
        &self.geometry
    }

    pub fn compute_target(&mut self, rel: &Position) {
        let az_src = rel.azim();
        let half_n = 0.5 * self.geometry.len() as f64;
        let targets = self.ramp.target_mut();
        for (t, spk) in targets.iter_mut().zip(self.geometry.iter()) {
            let az = half_n * spk.rel_azim(az_src).abs();
            let mut w = 0.0;
            if az < std::f64::consts::PI {
                w = 0.5 + 0.5 * az.cos();
                if self.wexp != 1.0 {
                    w = w.powf(self.wexp);
                }
            }
            *t = w as f32;
        }
    }

    pub fn render(&mut self, input: &[Sample], outputs: &mut ChannelBuffers) {
        self.ramp.mix(input, outputs);
    }

    pub fn add_diffuse(&self, foa: &FoaBlock, outputs: &mut ChannelBuffers) {
        decode_foa(&self.geometry, foa, outputs);
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
    use crate::diagnostics::Diagnostics;

    #[test]
    fn test_hann_lobes() {
        let geom = SpeakerArrayGeometry::ring(8, 1.0, &mut Diagnostics::new()).unwrap();
        let mut enc = HannEncoder::new(Arc::new(geom), 1.0).unwrap();

        enc.compute_target(&Position::FRONT);
        let t = enc.ramp().target();
        assert!((t[0] - 1.0).abs() < 1e-6);
        // neighbours at 45 degrees sit exactly at the lobe edge
        assert!(t[1].abs() < 1e-6 && t[7].abs() < 1e-6);
        assert!(t[2..7].iter().all(|&g| g == 0.0));

        enc.compute_target(&Position::from_sphere_deg(1.0, 22.5, 0.0));
        let t = enc.ramp().target();
        assert!((t[0] - 0.5).abs() < 1e-6);
        assert!((t[1] - 0.5).abs() < 1e-6);
    }
}
