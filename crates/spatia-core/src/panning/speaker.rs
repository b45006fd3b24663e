//! Shared output stage of speaker-based encoders

use crate::buffer::{ChannelBuffers, FoaBlock};
use crate::dsp::StaticDelay;
use crate::geometry::SpeakerArrayGeometry;

/// Decode a first-order diffuse field to every speaker
///
/// Uses the basic decoder weights of the geometry: `sqrt(2)/N` for `W` and
/// the speaker unit vector divided by `N` for `X`, `Y`, `Z`.
pub fn decode_foa(
    geometry: &SpeakerArrayGeometry,
    foa: &FoaBlock,
    outputs: &mut ChannelBuffers,
) {
    let (w, x, y, z) = (foa.w(), foa.x(), foa.y(), foa.z());
    for (k, spk) in geometry.iter().enumerate() {
        let out = outputs.channel_mut(k);
        for (i, o) in out.iter_mut().enumerate() {
            *o += spk.d_w * w[i] + spk.d_x * x[i] + spk.d_y * y[i] + spk.d_z * z[i];
        }
    }
}

/// Per-speaker calibration gain and delay compensation
///
/// Applied once per block to the summed receiver output, after all sources
/// have been mixed in.
#[derive(Debug, Clone)]
pub struct SpeakerPostProc {
    gains: Vec<f32>,
    delays: Vec<StaticDelay>,
}

impl SpeakerPostProc {
    pub fn new(geometry: &SpeakerArrayGeometry, sample_rate: f64, speed_of_sound: f64) -> Self {
        let delays = geometry
            .delay_compensation(sample_rate, speed_of_sound)
            .into_iter()
            .map(StaticDelay::new)
            .collect();
        Self {
            gains: geometry.output_gains(),
            delays,
        }
    }

    pub fn channels(&self) -> usize {
        self.gains.len()
    }

    pub fn gains(&self) -> &[f32] {
        &self.gains
    }

    /// Compensation delay of each channel in samples
    pub fn delays(&self) -> Vec<usize> {
        self.delays.iter().map(StaticDelay::delay).collect()
    }

    pub fn process(&mut self, outputs: &mut ChannelBuffers) {
        let stages = self.gains.iter().zip(self.delays.iter_mut());
        for (k, (gain, delay)) in stages.enumerate() {
            let out = outputs.channel_mut(k);
            delay.process(out);
            if *gain != 1.0 {
                out.iter_mut().for_each(|s| *s *= *gain);
            }
        }
    }

    pub fn reset(&mut self) {
        self.delays.iter_mut().for_each(StaticDelay::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::geometry::SpeakerDescriptor;

    #[test]
    fn test_decode_omni_field() {
        let mut diag = Diagnostics::new();
        let geom = SpeakerArrayGeometry::ring(4, 1.0, &mut diag).unwrap();
        let mut foa = FoaBlock::new(8);
        foa.get_mut(crate::buffer::FoaChannel::W).fill(1.0);

        let mut out = ChannelBuffers::new(4, 8);
        decode_foa(&geom, &foa, &mut out);
        let expected = std::f32::consts::SQRT_2 / 4.0;
        for k in 0..4 {
            assert!(out.channel(k).iter().all(|&s| (s - expected).abs() < 1e-6));
        }
    }

    #[test]
    fn test_postproc_delays_inner_speaker() {
        let mut diag = Diagnostics::new();
        let geom = SpeakerArrayGeometry::build(
            vec![
                SpeakerDescriptor::new(0.0, 0.0, 1.0),
                SpeakerDescriptor::new(180.0, 0.0, 0.5),
            ],
            &mut diag,
        )
        .unwrap();
        // 0.5 m at 340 m/s and 6800 Hz is 10 samples
        let mut post = SpeakerPostProc::new(&geom, 6800.0, 340.0);
        assert_eq!(post.delays(), vec![0, 10]);

        let mut out = ChannelBuffers::new(2, 16);
        out.channel_mut(0)[0] = 1.0;
        out.channel_mut(1)[0] = 1.0;
        post.process(&mut out);
        assert_eq!(out.channel(0)[0], 1.0);
        assert_eq!(out.channel(1)[0], 0.0);
        assert!((out.channel(1)[10] - 0.5).abs() < 1e-7);
    }
}
