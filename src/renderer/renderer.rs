use crate::renderer::error::{RenderError, Result};
use crate::renderer::frame_size::{FrameLayout, FrameSize};
use crate::renderer::texture::Texture;
use crate::renderer::timer::GpuTimer;
use crate::renderer::vertex::{FrameRect, Vertex};
use crate::renderer::EffectParameters;
use crate::rotation::Rotation;
use image::{DynamicImage, RgbaImage};
use tracing::{debug, warn};
use wgpu::util::DeviceExt;

pub static U32_SIZE: u32 = size_of::<u32>() as u32;

const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Headless renderer that samples an uploaded image into a rotated output.
pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    render_pipeline: wgpu::RenderPipeline,
    effects_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    frame_rect: FrameRect,
    frame_bind_group_layout: wgpu::BindGroupLayout,
    frame_texture: Texture,
    effect_parameters: EffectParameters,
    effects_buffer: wgpu::Buffer,
    effects_bind_group: wgpu::BindGroup,
    layout: FrameLayout,
    render_target: wgpu::Texture,
    output_texture_view: wgpu::TextureView,
    output_staging_buffer: wgpu::Buffer,
    output_dimensions: FrameSize,
    gpu_timer: Option<GpuTimer>,
}

impl Renderer {
    pub async fn new() -> Result<Renderer> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapterFound)?;

        debug!(adapter = ?adapter.get_info(), "Selected adapter");

        let supports_timestamps = adapter
            .features()
            .contains(wgpu::Features::TIMESTAMP_QUERY);
        if !supports_timestamps {
            warn!("Adapter does not support timestamp queries, GPU timings are disabled");
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: if supports_timestamps {
                        wgpu::Features::TIMESTAMP_QUERY
                    } else {
                        wgpu::Features::empty()
                    },
                    required_limits: wgpu::Limits::default(),
                    label: Some("texture rotation device"),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let gpu_timer = supports_timestamps.then(|| GpuTimer::new(&device));

        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("frame bind group layout"),
            });

        let effects_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("effects bind group layout"),
            });

        let effect_parameters = EffectParameters::new();
        let effects_buffer = effect_parameters.buffer(&device)?;

        let effects_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Effects Bind Group"),
            layout: &effects_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: effects_buffer.as_entire_binding(),
            }],
        });

        let frame_texture = Texture::new_for_size(
            FrameSize::new(1, 1),
            &device,
            &frame_bind_group_layout,
            "frame texture",
        );

        let frame_rect = FrameRect::new();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex buffer"),
            contents: bytemuck::cast_slice(&frame_rect.vertices()),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!("shader.wgsl"));

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&frame_bind_group_layout, &effects_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = Self::create_pipeline(
            &device,
            &render_pipeline_layout,
            &shader,
            "fs_main",
            "Render Pipeline",
        );
        let effects_pipeline = Self::create_pipeline(
            &device,
            &render_pipeline_layout,
            &shader,
            "fs_effects",
            "Effects Pipeline",
        );

        let output_dimensions = FrameSize::new(1, 1);
        let (render_target, output_staging_buffer, output_texture_view) =
            Self::create_render_target(output_dimensions, &device);

        Ok(Self {
            device,
            queue,
            render_pipeline,
            effects_pipeline,
            vertex_buffer,
            frame_rect,
            frame_bind_group_layout,
            frame_texture,
            effect_parameters,
            effects_buffer,
            effects_bind_group,
            layout: FrameLayout::default(),
            render_target,
            output_texture_view,
            output_staging_buffer,
            output_dimensions,
            gpu_timer,
        })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        fragment_entry_point: &str,
        label: &str,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(fragment_entry_point),
                targets: &[Some(OUTPUT_FORMAT.into())],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // mirrored y flips the winding of the strip
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    fn padded_bytes_per_row(row_width: u32) -> u32 {
        (row_width * U32_SIZE).div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
    }

    fn create_render_target(
        size: FrameSize,
        device: &wgpu::Device,
    ) -> (wgpu::Texture, wgpu::Buffer, wgpu::TextureView) {
        let render_target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Output Texture"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let output_texture_size = Self::padded_bytes_per_row(size.width) as wgpu::BufferAddress
            * size.height as wgpu::BufferAddress;

        let output_staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Output staging Buffer"),
            size: output_texture_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let output_texture_view =
            render_target.create_view(&wgpu::TextureViewDescriptor::default());

        (render_target, output_staging_buffer, output_texture_view)
    }

    fn update_render_target(&mut self, size: FrameSize) {
        debug!(width = size.width, height = size.height, "Resizing render target");
        let (render_target, output_staging_buffer, output_texture_view) =
            Self::create_render_target(size, &self.device);

        self.render_target = render_target;
        self.output_staging_buffer = output_staging_buffer;
        self.output_texture_view = output_texture_view;
        self.output_dimensions = size;
    }

    pub fn upload_image(&mut self, img: &DynamicImage) -> Result<()> {
        let size = FrameSize::new(img.width(), img.height());
        size.validate(self.max_texture_dimension())?;

        if self.frame_texture.size() != size {
            self.frame_texture = Texture::new_for_size(
                size,
                &self.device,
                &self.frame_bind_group_layout,
                "frame texture",
            );
            if let Some(timer) = self.gpu_timer.as_mut() {
                timer.reset();
            }
        }

        self.frame_texture.write_from_image(&self.queue, img)?;
        self.queue.submit([]);
        self.layout.set_output_size(size.width, size.height);
        Ok(())
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub fn rotation(&self) -> Rotation {
        self.layout.rotation()
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        debug!(%rotation, "Setting rotation");
        self.layout.set_rotation(rotation);
        self.frame_rect.orient(rotation);
        self.queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(&self.frame_rect.vertices()),
        );
    }

    /// Sets the output size in the orientation of the source image.
    pub fn set_output_size(&mut self, width: u32, height: u32) {
        self.layout.set_output_size(width, height);
    }

    pub fn output_size(&self) -> FrameSize {
        self.layout.output_size()
    }

    pub fn effect_parameters(&self) -> EffectParameters {
        self.effect_parameters
    }

    pub fn update_effects(&mut self, parameters: EffectParameters) -> Result<()> {
        self.queue
            .write_buffer(&self.effects_buffer, 0, &parameters.as_uniform_bytes()?);
        self.effect_parameters = parameters;
        Ok(())
    }

    fn prepare_render_pass(&self) -> wgpu::CommandBuffer {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());

        let pipeline = if self.effect_parameters.is_default() {
            &self.render_pipeline
        } else {
            &self.effects_pipeline
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.output_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: self
                    .gpu_timer
                    .as_ref()
                    .map(|timer| timer.render_pass_timestamp_writes()),
            });

            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &self.frame_texture.bind_group, &[]);
            render_pass.set_bind_group(1, &self.effects_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.draw(0..4, 0..1);
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.render_target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.output_staging_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(Self::padded_bytes_per_row(self.output_dimensions.width)),
                    rows_per_image: Some(self.output_dimensions.height),
                },
            },
            wgpu::Extent3d {
                width: self.output_dimensions.width,
                height: self.output_dimensions.height,
                depth_or_array_layers: 1,
            },
        );

        if let Some(timer) = &self.gpu_timer {
            timer.resolve(&mut encoder);
        }

        encoder.finish()
    }

    /// Draws the uploaded image with the current rotation and effects and reads it back.
    pub async fn render(&mut self) -> Result<RgbaImage> {
        let size = self.layout.output_size();
        size.validate(self.max_texture_dimension())?;
        if size != self.output_dimensions {
            self.update_render_target(size);
        }

        let command_buffer = self.prepare_render_pass();
        self.queue.submit(Some(command_buffer));

        let pixels = {
            let slice = self.output_staging_buffer.slice(..);
            let (sender, receiver) = tokio::sync::oneshot::channel();
            slice.map_async(wgpu::MapMode::Read, move |r| {
                let _ = sender.send(r);
            });
            self.device.poll(wgpu::Maintain::wait()).panic_on_timeout();
            receiver
                .await
                .map_err(|_| RenderError::MapCallbackDropped)??;

            let padded_bytes_per_row = Self::padded_bytes_per_row(size.width) as usize;
            let bytes_per_row = (size.width * U32_SIZE) as usize;

            let view = slice.get_mapped_range();
            let mut pixels = Vec::with_capacity(bytes_per_row * size.height as usize);
            for row in view.chunks_exact(padded_bytes_per_row) {
                pixels.extend_from_slice(&row[..bytes_per_row]);
            }
            pixels
        };
        self.output_staging_buffer.unmap();

        if let Some(timer) = self.gpu_timer.as_mut() {
            timer.collect_query_results(&self.device, &self.queue).await;
            debug!("{}", timer.frame_time_msg());
        }

        let actual = pixels.len();
        RgbaImage::from_raw(size.width, size.height, pixels).ok_or(
            RenderError::PixelBufferSize {
                expected: size.texture_size() as usize,
                actual,
            },
        )
    }

    pub fn frame_time_msg(&self) -> Option<String> {
        self.gpu_timer.as_ref().map(GpuTimer::frame_time_msg)
    }
}
