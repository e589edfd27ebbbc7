use crate::renderer::error::Result;
use encase::{ShaderType, UniformBuffer};
use wgpu::util::DeviceExt;

/// Colour adjustments applied after sampling the rotated frame.
#[derive(Debug, Copy, Clone, PartialEq, ShaderType)]
pub struct EffectParameters {
    pub contrast: f32,
    pub brightness: f32,
    pub saturation: f32,
    pub gamma: f32,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            contrast: 1f32,
            brightness: 0f32,
            saturation: 1f32,
            gamma: 1f32,
        }
    }
}

impl EffectParameters {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        self == &Default::default()
    }

    pub fn with_contrast(mut self, value: f32) -> Self {
        self.contrast = value;
        self
    }

    pub fn with_brightness(mut self, value: f32) -> Self {
        self.brightness = value;
        self
    }

    pub fn with_saturation(mut self, value: f32) -> Self {
        self.saturation = value;
        self
    }

    pub fn with_gamma(mut self, value: f32) -> Self {
        self.gamma = value;
        self
    }

    pub fn as_uniform_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = UniformBuffer::new(Vec::new());
        buffer.write(self)?;
        Ok(buffer.into_inner())
    }

    pub fn buffer(&self, device: &wgpu::Device) -> Result<wgpu::Buffer> {
        Ok(
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Effects Buffer"),
                contents: &self.as_uniform_bytes()?,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_a_no_op() {
        let params = EffectParameters::new();
        assert!(params.is_default());
        assert!(!params.with_gamma(2.2).is_default());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut params = EffectParameters::new()
            .with_contrast(1.2)
            .with_brightness(0.1)
            .with_saturation(0.0);
        params.reset();
        assert!(params.is_default());
    }

    #[test]
    fn uniform_layout_is_four_packed_floats() {
        let params = EffectParameters::new()
            .with_contrast(1.5)
            .with_brightness(-0.25);
        let bytes = params.as_uniform_bytes().unwrap();
        assert_eq!(bytes.len(), 16);

        let floats: Vec<f32> = bytemuck::pod_collect_to_vec(&bytes);
        assert_relative_eq!(floats[0], 1.5);
        assert_relative_eq!(floats[1], -0.25);
        assert_relative_eq!(floats[2], 1.0);
        assert_relative_eq!(floats[3], 1.0);
    }
}
