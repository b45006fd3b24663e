//! Speaker array geometry
//!
//! Built once at configuration time and immutable while rendering:
//! - [`SpeakerArrayGeometry`]: ordered speaker descriptors with derived
//!   radius, distance gain and delay compensation
//! - [`Vbap2dLayout`] / [`Vbap3dLayout`]: simplex sets with inverted basis
//!   matrices for vector-base amplitude panning

mod hull;
mod speaker;
mod vbap;

pub use hull::triangulate_hull;
pub use speaker::{SpeakerArrayGeometry, SpeakerDescriptor};
pub use vbap::{Simplex2d, Simplex3d, Vbap2dLayout, Vbap3dLayout};
