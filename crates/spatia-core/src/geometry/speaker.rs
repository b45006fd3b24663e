//! Speaker descriptors and the derived array geometry

use crate::diagnostics::Diagnostics;
use crate::error::{ConfigError, ConfigResult};
use crate::types::{db_to_gain, Position, DEG2RAD};

/// A single speaker (output channel) of an array
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerDescriptor {
    /// Position relative to the array centre in metres
    pub position: Position,
    /// Azimuth in radians
    pub az: f64,
    /// Elevation in radians
    pub el: f64,
    /// Distance from the array centre
    pub r: f64,
    /// Direction from the array centre
    pub unit_vector: Position,
    /// Calibration gain (linear)
    pub gain: f64,
    /// User delay compensation in seconds
    pub delay: f64,
    pub label: String,
    /// Distance normalisation gain `r / rmax` (set by the geometry)
    pub spkgain: f64,
    /// Distance to the outermost speaker `rmax - r` (set by the geometry)
    pub dr: f64,
    /// First-order diffuse decoder weights (set by the geometry)
    pub d_w: f32,
    pub d_x: f32,
    pub d_y: f32,
    pub d_z: f32,
}

impl SpeakerDescriptor {
    /// Create a speaker from azimuth/elevation in degrees and radius in metres
    pub fn new(az_deg: f64, el_deg: f64, r: f64) -> Self {
        let position = Position::from_sphere_deg(r, az_deg, el_deg);
        Self {
            position,
            az: az_deg * DEG2RAD,
            el: el_deg * DEG2RAD,
            r,
            unit_vector: position.normal(),
            gain: 1.0,
            delay: 0.0,
            label: String::new(),
            spkgain: 1.0,
            dr: 0.0,
            d_w: 0.0,
            d_x: 0.0,
            d_y: 0.0,
            d_z: 0.0,
        }
    }

    /// Set the calibration gain in dB
    pub fn with_gain_db(mut self, gain_db: f64) -> Self {
        self.gain = db_to_gain(gain_db);
        self
    }

    /// Set the user delay compensation in seconds
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Azimuth of the source relative to this speaker, wrapped to (-pi, pi]
    pub fn rel_azim(&self, az_src: f64) -> f64 {
        let d = az_src - self.az;
        d.sin().atan2(d.cos())
    }

    fn update_foa_decoder(&mut self, gain: f32) {
        self.d_w = std::f32::consts::SQRT_2 * gain;
        self.d_x = self.unit_vector.x as f32 * gain;
        self.d_y = self.unit_vector.y as f32 * gain;
        self.d_z = self.unit_vector.z as f32 * gain;
    }
}

/// Ordered set of speakers with derived radius information
///
/// Channel `k` of a speaker-based encoder renders to speaker `k`.
#[derive(Debug, Clone)]
pub struct SpeakerArrayGeometry {
    speakers: Vec<SpeakerDescriptor>,
    rmin: f64,
    rmax: f64,
}

impl SpeakerArrayGeometry {
    /// Build the geometry and derive per-speaker parameters
    pub fn build(
        mut speakers: Vec<SpeakerDescriptor>,
        diagnostics: &mut Diagnostics,
    ) -> ConfigResult<Self> {
        if speakers.is_empty() {
            return Err(ConfigError::TooFewChannels {
                algorithm: "speaker array",
                required: 1,
                actual: 0,
            });
        }
        let rmax = speakers.iter().map(|s| s.r).fold(f64::MIN, f64::max);
        let rmin = speakers.iter().map(|s| s.r).fold(f64::MAX, f64::min);
        if !(rmax > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "r",
                reason: "all speakers are at the array centre".to_string(),
            });
        }
        if rmin <= 0.0 {
            diagnostics.warn(
                "speakers",
                "speaker at the array centre has no direction, using front",
            );
        }
        let n = speakers.len();
        for spk in speakers.iter_mut() {
            spk.spkgain = spk.r / rmax;
            spk.dr = rmax - spk.r;
            spk.update_foa_decoder(1.0 / n as f32);
        }
        if (rmax - rmin) > 1e-6 {
            diagnostics.info(
                "speakers",
                format!(
                    "non-spherical layout: r in [{:.3}, {:.3}] m, delay compensation applied",
                    rmin, rmax
                ),
            );
        }
        log::debug!(
            "Speaker geometry built: {} channels, rmin={:.3}, rmax={:.3}",
            n,
            rmin,
            rmax
        );
        Ok(Self {
            speakers,
            rmin,
            rmax,
        })
    }

    /// Regular horizontal ring of `n` speakers starting at azimuth 0
    pub fn ring(n: usize, radius: f64, diagnostics: &mut Diagnostics) -> ConfigResult<Self> {
        let speakers = (0..n)
            .map(|k| SpeakerDescriptor::new(360.0 * k as f64 / n as f64, 0.0, radius))
            .collect();
        Self::build(speakers, diagnostics)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    #[inline]
    pub fn rmin(&self) -> f64 {
        self.rmin
    }

    #[inline]
    pub fn rmax(&self) -> f64 {
        self.rmax
    }

    pub fn speakers(&self) -> &[SpeakerDescriptor] {
        &self.speakers
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpeakerDescriptor> {
        self.speakers.iter()
    }

    /// Unit vectors of all speakers in channel order
    pub fn unit_vectors(&self) -> Vec<Position> {
        self.speakers.iter().map(|s| s.unit_vector).collect()
    }

    /// Per-speaker compensation delay in samples: the travel time difference
    /// to the outermost speaker plus the user delay
    pub fn delay_compensation(&self, sample_rate: f64, speed_of_sound: f64) -> Vec<usize> {
        self.speakers
            .iter()
            .map(|s| (sample_rate * (s.dr / speed_of_sound + s.delay)).round().max(0.0) as usize)
            .collect()
    }

    /// Per-speaker output gain: calibration times distance normalisation
    pub fn output_gains(&self) -> Vec<f32> {
        self.speakers
            .iter()
            .map(|s| (s.gain * s.spkgain) as f32)
            .collect()
    }
}

impl std::ops::Index<usize> for SpeakerArrayGeometry {
    type Output = SpeakerDescriptor;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.speakers[index]
    }
}
