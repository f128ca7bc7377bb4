//! A [`PassHost`] that runs the generated WGSL on a wgpu device.
//!
//! Every pass renders a fullscreen triangle into its own offscreen texture.
//! The scene lives in a texture of the same size, uploaded with
//! [`WgpuHost::upload_scene`]. Draws are recorded into one command encoder
//! and submitted by [`WgpuHost::finish_frame`] (or implicitly by
//! [`WgpuHost::read_frame`]).

mod readback;

use ahash::{HashMap, HashMapExt};

use crate::bank::{BlurPass, InputSource, PassId};
use crate::config::{ShaderDialect, VARYING_BUDGET};
use crate::error::BlurError;
use crate::host::{PassHost, Viewport};
use crate::shader::{ShaderPair, FRAGMENT_ENTRY_POINT, TEXEL_OFFSET_UNIFORM, VERTEX_ENTRY_POINT};

use readback::{
    create_readback_buffer, encode_copy_texture_to_buffer, map_buffer_into, padded_bytes_per_row,
    strip_row_padding,
};

/// Format of the scene and every pass target.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Layout of the `u_texelOffset` uniform, padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct TexelOffsetUniform {
    offset: [f32; 2],
    _padding: [f32; 2],
}

struct Target {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct TexelOffsetBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct GpuPass {
    pipeline: wgpu::RenderPipeline,
    input: wgpu::BindGroup,
    texel_offset: Option<TexelOffsetBinding>,
    target: Target,
    visible: bool,
}

pub struct WgpuHost {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,
    size: (u32, u32),
    sampler: wgpu::Sampler,
    input_bgl: wgpu::BindGroupLayout,
    texel_offset_bgl: wgpu::BindGroupLayout,
    scene: Target,
    scene_visible: bool,
    passes: HashMap<PassId, GpuPass>,
    encoder: Option<wgpu::CommandEncoder>,
    readback_bytes: Vec<u8>,
}

impl WgpuHost {
    /// Creates a host on the first available adapter, without a surface.
    ///
    /// Returns [`BlurError::AdapterNotFound`] when no adapter is available,
    /// so tests on machines without a GPU can skip instead of failing.
    pub async fn try_new_headless(width: u32, height: u32) -> Result<Self, BlurError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| BlurError::AdapterNotFound)?;

        let info = adapter.get_info();
        tracing::info!(
            adapter = %info.name,
            backend = ?info.backend,
            "using adapter for blur passes"
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("blurpass_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await?;

        Ok(Self::from_device(device, queue, TARGET_FORMAT, (width, height)))
    }

    /// Wraps an existing device. `format` must be a 4-byte color format;
    /// [`WgpuHost::read_frame`] returns pixels in that format's byte order.
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        size: (u32, u32),
    ) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blur_input_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let input_bgl = create_input_bind_group_layout(&device);
        let texel_offset_bgl = create_texel_offset_bind_group_layout(&device);
        let scene = create_target(
            &device,
            "blur_scene",
            size,
            format,
            wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
        );

        Self {
            device,
            queue,
            format,
            size,
            sampler,
            input_bgl,
            texel_offset_bgl,
            scene,
            scene_visible: true,
            passes: HashMap::new(),
            encoder: None,
            readback_bytes: Vec::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Replaces the scene with tightly packed pixels in the host's format.
    pub fn upload_scene(&mut self, pixels: &[u8]) -> Result<(), BlurError> {
        let (width, height) = self.size;
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(BlurError::SceneSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.scene.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        Ok(())
    }

    /// Submits the draws recorded since the last submission.
    pub fn finish_frame(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
    }

    /// Submits pending draws and reads back whatever is visible: the scene
    /// when it is shown, otherwise the visible pass with the highest id.
    pub fn read_frame(&mut self) -> Result<Vec<u8>, BlurError> {
        self.finish_frame();

        let texture = if self.scene_visible {
            &self.scene.texture
        } else {
            self.passes
                .iter()
                .filter(|(_, pass)| pass.visible)
                .max_by_key(|(id, _)| **id)
                .map(|(_, pass)| &pass.target.texture)
                .ok_or_else(|| BlurError::Readback("nothing is visible".to_string()))?
        };

        let (width, height) = self.size;
        let (unpadded, padded) = padded_bytes_per_row(width, 4);
        let buffer = create_readback_buffer(&self.device, padded as u64 * height as u64);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("blur_readback_encoder"),
            });
        encode_copy_texture_to_buffer(&mut encoder, texture, &buffer, self.size, padded);
        self.queue.submit(std::iter::once(encoder.finish()));

        let mut mapped = std::mem::take(&mut self.readback_bytes);
        let result = map_buffer_into(&self.device, &buffer, &mut mapped);
        let mut pixels = Vec::new();
        if result.is_ok() {
            strip_row_padding(&mapped, height, unpadded, padded, &mut pixels);
        }
        self.readback_bytes = mapped;

        result.map(|()| pixels)
    }

    fn compile_pipeline(&self, pass: PassId, shaders: &ShaderPair) -> wgpu::RenderPipeline {
        let vertex_label = format!("blur_pass{pass}_vertex");
        let vertex = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&vertex_label),
            source: wgpu::ShaderSource::Wgsl(shaders.vertex().into()),
        });

        let fragment_label = format!("blur_pass{pass}_fragment");
        let fragment = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&fragment_label),
            source: wgpu::ShaderSource::Wgsl(shaders.fragment().into()),
        });

        // Pass-through shaders declare no group(1).
        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = if shaders.uses_texel_offset() {
            vec![&self.input_bgl, &self.texel_offset_bgl]
        } else {
            vec![&self.input_bgl]
        };

        let layout_label = format!("blur_pass{pass}_layout");
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&layout_label),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &[],
            });

        let pipeline_label = format!("blur_pass{pass}_pipeline");
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&pipeline_label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: Some(VERTEX_ENTRY_POINT),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some(FRAGMENT_ENTRY_POINT),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn input_view(&self, pass: &BlurPass) -> Result<&wgpu::TextureView, BlurError> {
        match pass.input() {
            InputSource::Scene => Ok(&self.scene.view),
            InputSource::Pass(input) => self
                .passes
                .get(&input)
                .map(|source| &source.target.view)
                .ok_or(BlurError::UnpreparedInput {
                    pass: pass.id(),
                    input,
                }),
        }
    }

    fn create_texel_offset_binding(&self, pass: PassId) -> TexelOffsetBinding {
        let buffer_label = format!("blur_pass{pass}_texel_offset");
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&buffer_label),
            size: std::mem::size_of::<TexelOffsetUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&buffer_label),
            layout: &self.texel_offset_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        TexelOffsetBinding { buffer, bind_group }
    }
}

impl PassHost for WgpuHost {
    fn prepare_pass(&mut self, pass: &BlurPass) -> Result<(), BlurError> {
        let shaders = pass.shaders();
        if shaders.dialect() != ShaderDialect::Wgsl {
            return Err(BlurError::UnsupportedDialect {
                pass: pass.id(),
                dialect: shaders.dialect(),
            });
        }

        let coordinates = shaders.layout().coordinate_count();
        if coordinates > VARYING_BUDGET {
            return Err(BlurError::TooManyVaryings {
                pass: pass.id(),
                coordinates,
                limit: VARYING_BUDGET,
            });
        }

        let input_view = self.input_view(pass)?;
        let input_label = format!("blur_pass{}_input", pass.id());
        let input = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&input_label),
            layout: &self.input_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let pipeline = self.compile_pipeline(pass.id(), shaders);
        let texel_offset = shaders
            .uses_texel_offset()
            .then(|| self.create_texel_offset_binding(pass.id()));

        let target_label = format!("blur_pass{}_target", pass.id());
        let target = create_target(
            &self.device,
            &target_label,
            self.size,
            self.format,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        );

        tracing::debug!(
            pass = %pass.id(),
            radius = pass.radius(),
            coordinates,
            "compiled blur pass pipeline"
        );

        self.passes.insert(
            pass.id(),
            GpuPass {
                pipeline,
                input,
                texel_offset,
                target,
                visible: false,
            },
        );

        Ok(())
    }

    fn set_uniform_vec2(&mut self, pass: PassId, name: &str, value: [f32; 2]) {
        if name != TEXEL_OFFSET_UNIFORM {
            tracing::warn!(%pass, name, "ignoring unknown uniform");
            return;
        }

        let Some(binding) = self.passes.get(&pass).and_then(|p| p.texel_offset.as_ref()) else {
            return;
        };

        let uniform = TexelOffsetUniform {
            offset: value,
            _padding: [0.0; 2],
        };
        self.queue
            .write_buffer(&binding.buffer, 0, bytemuck::bytes_of(&uniform));
    }

    fn set_pass_visible(&mut self, pass: PassId, visible: bool) {
        if let Some(target) = self.passes.get_mut(&pass) {
            target.visible = visible;
        }
    }

    fn set_scene_visible(&mut self, visible: bool) {
        self.scene_visible = visible;
    }

    fn draw_pass(&mut self, pass: &BlurPass) {
        let Some(gpu_pass) = self.passes.get(&pass.id()) else {
            tracing::warn!(pass = %pass.id(), "draw of unprepared pass skipped");
            return;
        };

        let device = &self.device;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("blur_frame_encoder"),
            })
        });

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("blur_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &gpu_pass.target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&gpu_pass.pipeline);
        render_pass.set_bind_group(0, &gpu_pass.input, &[]);
        if let Some(binding) = &gpu_pass.texel_offset {
            render_pass.set_bind_group(1, &binding.bind_group, &[]);
        }
        render_pass.draw(0..3, 0..1);
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.size.0 as f32, self.size.1 as f32)
    }
}

fn create_target(
    device: &wgpu::Device,
    label: &str,
    size: (u32, u32),
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> Target {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    Target { texture, view }
}

/// Group 0: the pass input texture and its sampler.
fn create_input_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("blur_input_bgl"),
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
    })
}

/// Group 1: the texel offset, read by the vertex stage and by fragment
/// stages with inline fetches.
fn create_texel_offset_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("blur_texel_offset_bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}
