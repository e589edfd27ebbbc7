use crate::renderer::error::{RenderError, Result};
use crate::rotation::Rotation;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Checks the size can back a texture on a device with the given 2d dimension limit.
    pub fn validate(&self, max_dimension: u32) -> Result<()> {
        if self.is_empty() {
            return Err(RenderError::EmptyOutput(self.width, self.height));
        }
        if self.width > max_dimension || self.height > max_dimension {
            return Err(RenderError::OutputTooLarge {
                width: self.width,
                height: self.height,
                max: max_dimension,
            });
        }
        Ok(())
    }

    pub fn oriented(&self, rotation: Rotation) -> Self {
        let (width, height) = rotation.oriented_size(self.width, self.height);
        Self { width, height }
    }

    pub fn texture_size(&self) -> u64 {
        self.width as u64 * self.height as u64 * 4
    }
}

/// Tracks the size the renderer draws into.
///
/// The requested size is expressed in the orientation of the source image, the
/// output size follows the current rotation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    requested: FrameSize,
    rotation: Rotation,
}

impl FrameLayout {
    pub fn new(requested: FrameSize) -> Self {
        Self {
            requested,
            rotation: Rotation::None,
        }
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    pub fn set_output_size(&mut self, width: u32, height: u32) {
        self.requested = FrameSize::new(width, height);
    }

    pub fn output_size(&self) -> FrameSize {
        self.requested.oriented(self.rotation)
    }
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self::new(FrameSize::new(0, 0))
    }
}
