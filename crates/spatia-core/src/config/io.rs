//! YAML reading and writing for the config structs
//!
//! Render and stream settings fall back to defaults when their file is
//! missing or broken, so a fresh install starts with sensible values.
//! Speaker layouts have no meaningful default and are read strictly.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::SpeakerLayoutConfig;
use crate::diagnostics::Diagnostics;
use crate::geometry::SpeakerArrayGeometry;

/// Parse a YAML file, failing on any I/O or syntax problem
pub fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))
}

/// Load a config, using `T::default()` if the file is missing or invalid
///
/// ```ignore
/// let config: RenderConfig = load_config(&config_path(ConfigFile::Render));
/// ```
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("No config at {:?}, using defaults", path);
        return T::default();
    }
    match read_config(path) {
        Ok(config) => {
            log::info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("{:#}, using defaults", e);
            T::default()
        }
    }
}

/// Write a config as YAML, creating parent directories as needed
pub fn save_config<T: Serialize>(config: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    log::info!("Saved config to {:?}", path);
    Ok(())
}

/// Read a speaker layout file and build its geometry
pub fn load_layout(path: &Path, diagnostics: &mut Diagnostics) -> Result<SpeakerArrayGeometry> {
    let layout: SpeakerLayoutConfig = read_config(path)?;
    let geometry = layout
        .build_geometry(diagnostics)
        .with_context(|| format!("Invalid speaker layout in {:?}", path))?;
    log::info!(
        "Speaker layout {:?}: {} speakers, rmax {:.2} m",
        path,
        geometry.len(),
        geometry.rmax()
    );
    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EncoderConfig, RenderConfig, SpeakerConfig, StreamConfig};

    #[test]
    fn test_missing_file_returns_default() {
        let config: StreamConfig = load_config(Path::new("/nonexistent/path/stream.yaml"));
        assert_eq!(config, StreamConfig::default());
        assert!(read_config::<StreamConfig>(Path::new("/nonexistent/path/stream.yaml")).is_err());
    }

    #[test]
    fn test_invalid_yaml_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "sample_rate: [not a number").unwrap();

        let config: RenderConfig = load_config(&path);
        assert_eq!(config.sample_rate, RenderConfig::default().sample_rate);
    }

    #[test]
    fn test_render_config_roundtrip_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("render.yaml");

        let config = RenderConfig {
            sample_rate: 44100,
            encoder: EncoderConfig::Ambisonic {
                order: 3,
                horizontal: false,
                convention: crate::config::AmbisonicConvention::AcnSn3d,
            },
            ..Default::default()
        };
        save_config(&config, &path).unwrap();
        let loaded: RenderConfig = load_config(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_layout_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.yaml");

        let layout = SpeakerLayoutConfig {
            speakers: vec![
                SpeakerConfig {
                    az: 30.0,
                    label: "L".to_string(),
                    ..Default::default()
                },
                SpeakerConfig {
                    az: -30.0,
                    gain_db: -1.5,
                    label: "R".to_string(),
                    ..Default::default()
                },
            ],
        };
        save_config(&layout, &path).unwrap();
        let loaded: SpeakerLayoutConfig = load_config(&path);
        assert_eq!(loaded, layout);
    }

    #[test]
    fn test_load_layout_builds_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.yaml");
        let layout = SpeakerLayoutConfig {
            speakers: (0..4)
                .map(|k| SpeakerConfig {
                    az: 90.0 * k as f64,
                    r: 2.0,
                    ..Default::default()
                })
                .collect(),
        };
        save_config(&layout, &path).unwrap();

        let mut diag = Diagnostics::new();
        let geometry = load_layout(&path, &mut diag).unwrap();
        assert_eq!(geometry.len(), 4);
        assert_eq!(geometry.rmax(), 2.0);
    }

    #[test]
    fn test_load_layout_rejects_empty_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        std::fs::write(&path, "speakers: []\n").unwrap();

        let mut diag = Diagnostics::new();
        assert!(load_layout(&path, &mut diag).is_err());
        assert!(load_layout(&dir.path().join("missing.yaml"), &mut diag).is_err());
    }
}
