//! Vector-base amplitude panning encoders

use std::sync::Arc;

use super::speaker::decode_foa;
use super::GainRamp;
use crate::buffer::{ChannelBuffers, FoaBlock};
use crate::diagnostics::Diagnostics;
use crate::error::ConfigResult;
use crate::geometry::{SpeakerArrayGeometry, Vbap2dLayout, Vbap3dLayout};
use crate::types::{Position, Sample};

#[derive(Debug, Clone)]
enum Layout {
    Planar(Vbap2dLayout),
    Spatial(Vbap3dLayout),
}

#[derive(Debug, Clone)]
pub struct VbapEncoder {
    geometry: Arc<SpeakerArrayGeometry>,
    layout: Layout,
    /// Scratch gains, one per speaker
    gains: Vec<f64>,
    ramp: GainRamp,
}

impl VbapEncoder {
    /// Pairwise panning on a horizontal ring
    pub fn planar(geometry: Arc<SpeakerArrayGeometry>) -> ConfigResult<Self> {
        let layout = Layout::Planar(Vbap2dLayout::build(&geometry)?);
        Ok(Self::with_layout(geometry, layout))
    }

    /// Triplet panning on a 3-D layout
    pub fn spatial(
        geometry: Arc<SpeakerArrayGeometry>,
        diagnostics: &mut Diagnostics,
    ) -> ConfigResult<Self> {
        let layout = Layout::Spatial(Vbap3dLayout::build(&geometry, diagnostics)?);
        Ok(Self::with_layout(geometry, layout))
    }

    fn with_layout(geometry: Arc<SpeakerArrayGeometry>, layout: Layout) -> Self {
        let n = geometry.len();
        Self {
            geometry,
            layout,
            gains: vec![0.0; n],
            ramp: GainRamp::new(n),
        }
    }

    pub fn geometry(&self) -> &Arc<SpeakerArrayGeometry> {
        &self.geometry
    }

    pub fn is_planar(&self) -> bool {
        matches!(self.layout, Layout::Planar(_))
    }

    pub fn compute_target(&mut self, rel: &Position) {
        match &self.layout {
            Layout::Planar(l) => l.compute_gains(rel, &mut self.gains),
            Layout::Spatial(l) => l.compute_gains(rel, &mut self.gains),
        }
        for (t, g) in self.ramp.target_mut().iter_mut().zip(&self.gains) {
            *t = *g as f32;
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
