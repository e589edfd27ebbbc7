mod effects;
mod error;
mod frame_size;
pub mod renderer;
mod texture;
mod timer;
mod vertex;

pub use effects::EffectParameters;
pub use error::{RenderError, Result};
pub use frame_size::{FrameLayout, FrameSize};
pub use renderer::Renderer;
pub use vertex::{FrameRect, Vertex, QUAD};
