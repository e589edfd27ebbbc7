use crate::rotation::Rotation;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    position: [f32; 2],
    tex_coords: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 2], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            tex_coords,
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Clip space corners in the same order as the rotation tables, drawn as a triangle strip.
pub const QUAD: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];

pub struct FrameRect {
    position: [[f32; 2]; 4],
    tex_coords: [[f32; 2]; 4],
}

impl FrameRect {
    pub fn new() -> Self {
        Self {
            position: QUAD,
            tex_coords: Rotation::None.corners(),
        }
    }

    pub fn reset(&mut self) {
        self.tex_coords = Rotation::None.corners();
    }

    pub fn vertices(&self) -> [Vertex; 4] {
        [0, 1, 2, 3].map(|corner| Vertex::new(self.position[corner], self.tex_coords[corner]))
    }

    pub fn orient(&mut self, rotation: Rotation) {
        self.tex_coords = rotation.corners();
    }
}

impl Default for FrameRect {
    fn default() -> Self {
        Self::new()
    }
}
