//! Render and encoder configuration

use serde::{Deserialize, Serialize};

use crate::types::{BLOCK_SIZE, SAMPLE_RATE, SPEED_OF_SOUND};

/// Global rendering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Sample rate in Hz
    /// Default: 48000
    pub sample_rate: u32,

    /// Frames per audio block
    /// Default: 256
    pub block_size: usize,

    /// Speed of sound in m/s
    /// Default: 340
    pub speed_of_sound: f64,

    /// Sinc interpolation order of distance delay lines (0 = integer delay)
    /// Default: 4
    pub sinc_order: u32,

    /// Sinc table oversampling
    /// Default: 64
    pub oversampling: u32,

    /// Largest source distance the delay lines are sized for, in metres;
    /// sources further away are not rendered
    /// Default: 100
    pub max_distance: f64,

    /// Low-pass sources with distance (air absorption)
    /// Default: true
    pub air_absorption: bool,

    /// Panning algorithm of the receiver
    pub encoder: EncoderConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            block_size: BLOCK_SIZE,
            speed_of_sound: SPEED_OF_SOUND,
            sinc_order: 4,
            oversampling: 64,
            max_distance: 100.0,
            air_absorption: true,
            encoder: EncoderConfig::default(),
        }
    }
}

/// Ambisonic normalisation and channel ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbisonicConvention {
    /// Furse-Malham: `W` scaled by -3 dB, letter-named channels
    #[default]
    Fuma,
    /// ACN channel order with SN3D normalisation
    AcnSn3d,
}

/// Panning algorithm selection and parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncoderConfig {
    /// Single channel, direction independent
    #[default]
    Omni,

    /// First-order virtual microphone: `g = 1 + a (cos θ - 1)`, raised to `exponent`
    Cardioid {
        /// 0 = omni, 0.5 = cardioid, 1 = figure of eight
        #[serde(default = "default_cardioid_a")]
        a: f64,
        #[serde(default = "default_one")]
        exponent: f64,
    },

    /// Cardioid with direction dependent low-pass
    ShapedCardioid {
        /// 6 dB cutoff frequency for sources at 90 degrees, in Hz
        #[serde(default = "default_f6db")]
        f6db: f64,
        /// Cutoff frequency for sources at 180 degrees, in Hz
        #[serde(default = "default_fmin")]
        fmin: f64,
    },

    /// Linear attenuation ramp between two off-axis angles
    ThresholdCardioid {
        /// Angle where attenuation starts, in degrees
        #[serde(default)]
        start_deg: f64,
        /// Angle of full attenuation, in degrees
        #[serde(default = "default_stop_deg")]
        stop_deg: f64,
    },

    /// Hann-window panning over a speaker ring
    Hann {
        #[serde(default = "default_wexp")]
        wexp: f64,
    },

    /// Ambisonic encoding up to third order
    Ambisonic {
        order: u32,
        #[serde(default)]
        horizontal: bool,
        #[serde(default)]
        convention: AmbisonicConvention,
    },

    /// Vector-base amplitude panning on a horizontal ring
    Vbap2d,

    /// Vector-base amplitude panning on a 3-D layout
    Vbap3d,

    /// Wave-field synthesis
    Wfs {
        /// Plane-wave approximation instead of point sources
        #[serde(default = "default_true")]
        planewave: bool,
    },
}

impl EncoderConfig {
    /// Short algorithm name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::Omni => "omni",
            Self::Cardioid { .. } => "cardioid",
            Self::ShapedCardioid { .. } => "shaped_cardioid",
            Self::ThresholdCardioid { .. } => "threshold_cardioid",
            Self::Hann { .. } => "hann",
            Self::Ambisonic { .. } => "ambisonic",
            Self::Vbap2d => "vbap2d",
            Self::Vbap3d => "vbap3d",
            Self::Wfs { .. } => "wfs",
        }
    }

    /// True if the algorithm renders to a speaker array
    pub fn needs_geometry(&self) -> bool {
        matches!(
            self,
            Self::Hann { .. } | Self::Vbap2d | Self::Vbap3d | Self::Wfs { .. }
        )
    }
}

fn default_cardioid_a() -> f64 {
    0.5
}

fn default_one() -> f64 {
    1.0
}

fn default_f6db() -> f64 {
    1000.0
}

fn default_fmin() -> f64 {
    60.0
}

fn default_stop_deg() -> f64 {
    90.0
}

fn default_wexp() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_encoder_with_defaults() {
        let config: EncoderConfig = serde_yaml::from_str("type: cardioid").unwrap();
        assert_eq!(
            config,
            EncoderConfig::Cardioid {
                a: 0.5,
                exponent: 1.0
            }
        );

        let config: EncoderConfig = serde_yaml::from_str("type: wfs").unwrap();
        assert_eq!(config, EncoderConfig::Wfs { planewave: true });
        assert!(config.needs_geometry());
    }

    #[test]
    fn test_ambisonic_from_yaml() {
        let yaml = "type: ambisonic\norder: 2\nconvention: acn_sn3d\n";
        let config: EncoderConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config,
            EncoderConfig::Ambisonic {
                order: 2,
                horizontal: false,
                convention: AmbisonicConvention::AcnSn3d
            }
        );
        assert_eq!(config.name(), "ambisonic");
    }

    #[test]
    fn test_partial_render_config() {
        let config: RenderConfig = serde_yaml::from_str("block_size: 64").unwrap();
        assert_eq!(config.block_size, 64);
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.encoder, EncoderConfig::Omni);
        assert!(config.air_absorption);
    }
}
