//! Configuration for the rendering core
//!
//! - Generic YAML config loading/saving
//! - Config directory layout and named speaker layouts
//! - Render, speaker layout, encoder and streaming parameters
//!
//! # Usage
//!
//! ```ignore
//! use spatia_core::config::{config_path, load_config, load_layout, named_layout_path};
//! use spatia_core::config::{ConfigFile, RenderConfig};
//!
//! let path = config_path(ConfigFile::Render);
//! let config: RenderConfig = load_config(&path);
//! let geometry = load_layout(&named_layout_path("quad"), &mut diagnostics)?;
//! save_config(&config, &path)?;
//! ```

mod io;
mod layout;
mod paths;
mod render;
mod stream;

pub use io::{load_config, load_layout, read_config, save_config};
pub use layout::{SpeakerConfig, SpeakerLayoutConfig};
pub use paths::{
    config_dir, config_path, layout_dir, named_layout_path, ConfigFile, CONFIG_DIR_ENV,
};
pub use render::{AmbisonicConvention, EncoderConfig, RenderConfig};
pub use stream::StreamConfig;
