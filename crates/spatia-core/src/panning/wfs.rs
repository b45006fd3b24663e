//! Wave-field synthesis
//!
//! Every speaker facing the source gets a gain proportional to the cosine
//! between source direction and speaker direction (normalised to sum 1),
//! and a delay that aligns the speakers to the incoming wavefront. Each
//! channel runs its own fractional delay line.

use std::sync::Arc;

use super::speaker::decode_foa;
use super::GainRamp;
use crate::buffer::{ChannelBuffers, FoaBlock};
use crate::dsp::FractionalDelayLine;
use crate::error::ConfigResult;
use crate::geometry::SpeakerArrayGeometry;
use crate::types::{Position, Sample};

#[derive(Debug, Clone)]
pub struct WfsEncoder {
    geometry: Arc<SpeakerArrayGeometry>,
    planewave: bool,
    lines: Vec<FractionalDelayLine>,
    /// Current and target per-channel delay, in metres
    delay: Vec<f32>,
    delay_target: Vec<f32>,
    ramp: GainRamp,
}

impl WfsEncoder {
    pub fn new(
        geometry: Arc<SpeakerArrayGeometry>,
        planewave: bool,
        sample_rate: f64,
        speed_of_sound: f64,
        sinc_order: u32,
        oversampling: u32,
    ) -> ConfigResult<Self> {
        let n = geometry.len();
        // wavefront delays never exceed twice the array radius
        let max_distance = 2.0 * geometry.rmax();
        let lines = (0..n)
            .map(|_| {
                FractionalDelayLine::for_distance(
                    max_distance,
                    sample_rate,
                    speed_of_sound,
                    sinc_order,
                    oversampling,
                )
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self {
            geometry,
            planewave,
            lines,
            delay: vec![0.0; n],
            delay_target: vec![0.0; n],
            ramp: GainRamp::new(n),
        })
    }

    pub fn geometry(&self) -> &Arc<SpeakerArrayGeometry> {
        &self.geometry
    }

    pub fn planewave(&self) -> bool {
        self.planewave
    }

    pub fn set_planewave(&mut self, planewave: bool) {
        self.planewave = planewave;
    }

    /// Target delays in metres
    pub fn delay_target(&self) -> &[f32] {
        &self.delay_target
    }

    pub fn compute_target(&mut self, rel: &Position) {
        let psrc = rel.normal();
        let rmax = self.geometry.rmax();
        let rmax_minus_dist = rmax - rel.norm();

        let gains = self.ramp.target_mut();
        let mut wsum = 0.0f64;
        for (k, spk) in self.geometry.iter().enumerate() {
            let w = psrc.dot(&spk.unit_vector).max(0.0);
            wsum += w;
            gains[k] = w as f32;
            self.delay_target[k] = if self.planewave {
                (rmax - spk.r * w) as f32
            } else {
                (rmax_minus_dist + spk.position.distance(rel)).max(0.0) as f32
            };
        }
        let scale = if wsum > 0.0 { (1.0 / wsum) as f32 } else { 1.0 };
        gains.iter_mut().for_each(|g| *g *= scale);
    }

    pub fn render(&mut self, input: &[Sample], outputs: &mut ChannelBuffers) {
        let frames = input.len().max(1) as f32;
        for (k, line) in self.lines.iter_mut().enumerate() {
            let dg = self.ramp.step(k, input.len());
            let dd = (self.delay_target[k] - self.delay[k]) / frames;
            let mut g = self.ramp.current()[k];
            let mut d = self.delay[k];
            for (o, &x) in outputs.channel_mut(k).iter_mut().zip(input) {
                g += dg;
                d += dd;
                *o += line.get_dist_push(d, x) * g;
            }
        }
        self.delay.copy_from_slice(&self.delay_target);
        self.ramp.snap();
    }

    pub fn add_diffuse(&self, foa: &FoaBlock, outputs: &mut ChannelBuffers) {
        decode_foa(&self.geometry, foa, outputs);
    }

    pub fn reset(&mut self) {
        self.lines.iter_mut().for_each(FractionalDelayLine::reset);
        self.delay.fill(0.0);
        self.delay_target.fill(0.0);
        self.ramp.reset();
    }

    pub(super) fn ramp(&self) -> &GainRamp {
        &self.ramp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;

    fn ring(n: usize) -> Arc<SpeakerArrayGeometry> {
        Arc::new(SpeakerArrayGeometry::ring(n, 2.0, &mut Diagnostics::new()).unwrap())
    }

    #[test]
    fn test_gains_sum_to_one() {
        let mut enc = WfsEncoder::new(ring(8), true, 48000.0, 340.0, 0, 1).unwrap();
        enc.compute_target(&Position::from_sphere_deg(5.0, 30.0, 0.0));
        let sum: f32 = enc.ramp().target().iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(enc.ramp().target().iter().all(|&g| g >= 0.0));
        // speakers facing away are silent
        assert_eq!(enc.ramp().target()[4], 0.0);
    }

    #[test]
    fn test_planewave_delays() {
        let mut enc = WfsEncoder::new(ring(4), true, 48000.0, 340.0, 0, 1).unwrap();
        enc.compute_target(&Position::new(10.0, 0.0, 0.0));
        let d = enc.delay_target();
        // facing speaker is closest to the wavefront
        assert!((d[0] - 0.0).abs() < 1e-6);
        assert!((d[1] - 2.0).abs() < 1e-6);
        assert!((d[2] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_point_source_delays() {
        let mut enc = WfsEncoder::new(ring(4), false, 48000.0, 340.0, 0, 1).unwrap();
        enc.compute_target(&Position::new(4.0, 0.0, 0.0));
        let d = enc.delay_target();
        // rmax - |p| + |spk - p|
        assert!((d[0] - 0.0).abs() < 1e-6);
        assert!((d[2] - 4.0).abs() < 1e-6);
        let side = 2.0 - 4.0 + (4.0f32 * 4.0 + 2.0 * 2.0).sqrt();
        assert!((d[1] - side).abs() < 1e-5);
    }

    #[test]
    fn test_render_delays_impulse() {
        // 100 samples per metre
        let mut enc = WfsEncoder::new(ring(4), true, 34000.0, 340.0, 4, 64).unwrap();
        let src = Position::from_sphere_deg(10.0, 60.0, 0.0);
        enc.compute_target(&src);
        let mut out = ChannelBuffers::new(4, 512);
        enc.render(&vec![0.0; 512], &mut out);

        // steady state: speaker 0 sits 1 m behind the plane wavefront
        enc.compute_target(&src);
        let g0 = enc.ramp().target()[0];
        assert!((g0 - 0.5 / (0.5 + 0.75f32.sqrt())).abs() < 1e-5);

        let mut input = vec![0.0; 512];
        input[0] = 1.0;
        out.fill_silence();
        enc.render(&input, &mut out);
        let ch0 = out.channel(0);
        assert!((ch0[100] - g0).abs() < 1e-3);
        assert!(ch0[99].abs() < 1e-3 && ch0[101].abs() < 1e-3);
        assert!(ch0[0].abs() < 1e-6);
        assert!(out.channel(2).iter().all(|&s| s == 0.0));
    }
}
