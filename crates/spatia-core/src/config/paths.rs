//! Locations of render, layout and stream configuration files
//!
//! All files live in one directory, `$SPATIA_CONFIG_DIR` when set, otherwise
//! `spatia/` under the platform config directory. Named speaker layouts are
//! kept in its `layouts/` subdirectory:
//!
//! ```text
//! spatia/
//!   render.yaml
//!   stream.yaml
//!   layouts/
//!     quad.yaml
//!     dome-24.yaml
//! ```

use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "SPATIA_CONFIG_DIR";

const LAYOUT_DIR: &str = "layouts";
const LAYOUT_EXTENSION: &str = "yaml";

/// One of the configuration files of the rendering core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFile {
    /// [`RenderConfig`](super::RenderConfig)
    Render,
    /// [`StreamConfig`](super::StreamConfig)
    Stream,
    /// Active [`SpeakerLayoutConfig`](super::SpeakerLayoutConfig)
    Layout,
}

impl ConfigFile {
    pub fn file_name(self) -> &'static str {
        match self {
            ConfigFile::Render => "render.yaml",
            ConfigFile::Stream => "stream.yaml",
            ConfigFile::Layout => "layout.yaml",
        }
    }
}

/// Configuration directory
pub fn config_dir() -> PathBuf {
    config_dir_from(std::env::var_os(CONFIG_DIR_ENV))
}

fn config_dir_from(overridden: Option<OsString>) -> PathBuf {
    match overridden {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spatia"),
    }
}

/// Path of one configuration file
pub fn config_path(file: ConfigFile) -> PathBuf {
    config_dir().join(file.file_name())
}

/// Directory of named speaker layouts
pub fn layout_dir() -> PathBuf {
    config_dir().join(LAYOUT_DIR)
}

/// Path of a named layout, e.g. `"quad"` -> `layouts/quad.yaml`
///
/// A name that already carries the extension is used as is.
pub fn named_layout_path(name: &str) -> PathBuf {
    let mut path = layout_dir().join(name);
    if path.extension().map_or(true, |ext| ext != LAYOUT_EXTENSION) {
        path.set_extension(LAYOUT_EXTENSION);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_replaces_platform_dir() {
        let dir = config_dir_from(Some(OsString::from("/srv/spatia-rig")));
        assert_eq!(dir, PathBuf::from("/srv/spatia-rig"));
    }

    #[test]
    fn test_empty_override_is_ignored() {
        assert!(config_dir_from(Some(OsString::new())).ends_with("spatia"));
        assert!(config_dir_from(None).ends_with("spatia"));
    }

    #[test]
    fn test_config_files_share_one_directory() {
        let render = config_path(ConfigFile::Render);
        let stream = config_path(ConfigFile::Stream);
        assert!(render.ends_with("render.yaml"));
        assert!(stream.ends_with("stream.yaml"));
        assert_eq!(render.parent(), stream.parent());
        assert!(config_path(ConfigFile::Layout).ends_with("layout.yaml"));
    }

    #[test]
    fn test_named_layouts() {
        assert!(named_layout_path("quad").ends_with("layouts/quad.yaml"));
        assert!(named_layout_path("dome-24.yaml").ends_with("layouts/dome-24.yaml"));
        assert_eq!(named_layout_path("quad").parent(), Some(layout_dir().as_path()));
    }
}
