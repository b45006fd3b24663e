//! Speaker layout configuration

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::error::ConfigResult;
use crate::geometry::{SpeakerArrayGeometry, SpeakerDescriptor};

/// A single speaker as written in a layout file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerConfig {
    /// Azimuth in degrees, counter-clockwise from the front
    pub az: f64,
    /// Elevation in degrees
    pub el: f64,
    /// Distance from the array centre in metres
    /// Default: 1.0
    pub r: f64,
    /// Calibration gain in dB
    pub gain_db: f64,
    /// Additional delay compensation in seconds
    pub delay: f64,
    pub label: String,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            az: 0.0,
            el: 0.0,
            r: 1.0,
            gain_db: 0.0,
            delay: 0.0,
            label: String::new(),
        }
    }
}

impl SpeakerConfig {
    pub fn to_descriptor(&self) -> SpeakerDescriptor {
        SpeakerDescriptor::new(self.az, self.el, self.r)
            .with_gain_db(self.gain_db)
            .with_delay(self.delay)
            .with_label(self.label.clone())
    }
}

/// Ordered list of speakers; channel `k` is speaker `k`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerLayoutConfig {
    pub speakers: Vec<SpeakerConfig>,
}

impl SpeakerLayoutConfig {
    /// Build the runtime geometry from this layout
    pub fn build_geometry(
        &self,
        diagnostics: &mut Diagnostics,
    ) -> ConfigResult<SpeakerArrayGeometry> {
        let speakers = self
            .speakers
            .iter()
            .map(SpeakerConfig::to_descriptor)
            .collect();
        SpeakerArrayGeometry::build(speakers, diagnostics)
    }
}
