pub mod renderer;
pub mod rotation;

pub use renderer::{EffectParameters, RenderError, Renderer};
pub use rotation::{Rotation, RotationError, TexCoords};
