//! Render engine
//!
//! - [`RenderPair`]: distance delay, attenuation and panning of one source
//! - [`Renderer`]: all pairs of one receiver, fed through a lock-free
//!   command queue
//! - deferred deallocation of removed pairs via `basedrop`

mod command;
mod gc;
mod pair;
mod renderer;

pub use command::{command_channel, RenderCommand, COMMAND_QUEUE_CAPACITY};
pub use gc::gc_handle;
pub use pair::{PairFactory, RenderPair};
pub use renderer::Renderer;
