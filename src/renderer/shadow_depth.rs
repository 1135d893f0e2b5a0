//! wgpu Shadow Backend
//!
//! [`WgpuShadowBackend`] implements [`ShadowBackend`] on top of a wgpu device:
//!
//! - cascade depth textures are plain 2D textures usable both as depth
//!   attachment and as shader resource
//! - shadow casters are registered once and drawn by every depth pass whose
//!   culling filter accepts their layers
//! - per-caster matrices live in one uniform buffer addressed with dynamic
//!   offsets, grown by doubling
//! - each depth render is encoded and submitted immediately; nothing waits
//!   on the GPU

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::errors::{Result, ShadowError};
use crate::scene::LayerMask;
use crate::shadow::backend::{DepthRenderRequest, DepthTextureDesc, ShadowBackend};
use crate::shadow::settings::FALLBACK_DEPTH_FORMAT;

/// Depth formats the backend knows how to render and sample.
const CANDIDATE_DEPTH_FORMATS: [wgpu::TextureFormat; 5] = [
    wgpu::TextureFormat::Depth16Unorm,
    wgpu::TextureFormat::Depth24Plus,
    wgpu::TextureFormat::Depth24PlusStencil8,
    wgpu::TextureFormat::Depth32Float,
    wgpu::TextureFormat::Depth32FloatStencil8,
];

const DEPTH_PASS_UNIFORM_SIZE: u64 = std::mem::size_of::<DepthPassUniform>() as u64;

/// A cascade depth texture.
#[derive(Debug, Clone)]
pub struct ShadowTexture {
    pub texture: wgpu::Texture,
    /// Depth attachment view.
    pub view: wgpu::TextureView,
    /// Depth-aspect view for binding in shading passes.
    pub sample_view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub size: u32,
}

/// Handle of a registered shadow caster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CasterId(u64);

/// Index data of a caster.
#[derive(Debug, Clone)]
pub struct CasterIndices {
    pub buffer: wgpu::Buffer,
    pub format: wgpu::IndexFormat,
    pub count: u32,
}

/// Geometry drawn into the cascade depth maps.
///
/// The vertex buffer must start every vertex with a `Float32x3` position.
#[derive(Debug, Clone)]
pub struct ShadowCaster {
    pub vertex_buffer: wgpu::Buffer,
    /// Byte stride between consecutive vertices.
    pub vertex_stride: wgpu::BufferAddress,
    pub vertex_count: u32,
    pub indices: Option<CasterIndices>,
    /// Object → world.
    pub model: Mat4,
    pub layers: LayerMask,
}

/// Id-keyed caster storage with monotonically allocated ids.
#[derive(Debug)]
struct CasterRegistry<C> {
    casters: FxHashMap<CasterId, C>,
    next_id: u64,
}

impl<C> Default for CasterRegistry<C> {
    fn default() -> Self {
        Self {
            casters: FxHashMap::default(),
            next_id: 0,
        }
    }
}

impl<C> CasterRegistry<C> {
    fn insert(&mut self, caster: C) -> CasterId {
        let id = CasterId(self.next_id);
        self.next_id += 1;
        self.casters.insert(id, caster);
        id
    }

    fn remove(&mut self, id: CasterId) -> Option<C> {
        self.casters.remove(&id)
    }

    fn get(&self, id: CasterId) -> Option<&C> {
        self.casters.get(&id)
    }

    fn get_mut(&mut self, id: CasterId) -> Option<&mut C> {
        self.casters.get_mut(&id)
    }

    fn len(&self) -> usize {
        self.casters.len()
    }

    fn iter(&self) -> impl Iterator<Item = (CasterId, &C)> {
        self.casters.iter().map(|(&id, caster)| (id, caster))
    }
}

/// Ids of the casters a depth pass draws, in draw order.
///
/// `entries` are `(id, layers, vertex_stride)`. Casters whose layers the
/// `culling` filter rejects are dropped; the rest are grouped by vertex
/// stride so consecutive draws share a pipeline, then ordered by id.
fn select_visible(
    entries: impl IntoIterator<Item = (CasterId, LayerMask, wgpu::BufferAddress)>,
    culling: LayerMask,
) -> Vec<(CasterId, wgpu::BufferAddress)> {
    let mut visible: Vec<_> = entries
        .into_iter()
        .filter(|&(_, layers, _)| culling.accepts(layers))
        .map(|(id, _, stride)| (id, stride))
        .collect();
    visible.sort_by_key(|&(id, stride)| (stride, id));
    visible
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct DepthPassUniform {
    light_view_proj: Mat4,
    model: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DepthPipelineKey {
    format: wgpu::TextureFormat,
    compare: wgpu::CompareFunction,
    vertex_stride: wgpu::BufferAddress,
}

pub struct WgpuShadowBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    supported_formats: Vec<wgpu::TextureFormat>,

    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: FxHashMap<DepthPipelineKey, wgpu::RenderPipeline>,

    uniform_buffer: wgpu::Buffer,
    uniform_capacity: u32,
    uniform_stride: u32,
    bind_group: wgpu::BindGroup,

    casters: CasterRegistry<ShadowCaster>,
}

impl WgpuShadowBackend {
    /// Creates the backend.
    ///
    /// Fails if the adapter cannot render to [`FALLBACK_DEPTH_FORMAT`].
    pub fn new(adapter: &wgpu::Adapter, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Self> {
        let required = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let supported_formats: Vec<_> = CANDIDATE_DEPTH_FORMATS
            .into_iter()
            .filter(|&format| {
                if format == wgpu::TextureFormat::Depth32FloatStencil8
                    && !device.features().contains(wgpu::Features::DEPTH32FLOAT_STENCIL8)
                {
                    return false;
                }
                adapter
                    .get_texture_format_features(format)
                    .allowed_usages
                    .contains(required)
            })
            .collect();

        if !supported_formats.contains(&FALLBACK_DEPTH_FORMAT) {
            return Err(ShadowError::NoDepthFormat(format!(
                "{FALLBACK_DEPTH_FORMAT:?} is not renderable on this adapter"
            )));
        }
        log::debug!("Shadow depth formats supported: {supported_formats:?}");

        let min_alignment = device.limits().min_uniform_buffer_offset_alignment.max(1);
        let stride = align_to(DEPTH_PASS_UNIFORM_SIZE as u32, min_alignment);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Cascade Shadow Depth Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/shadow_depth.wgsl"))),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Cascade Shadow BindGroup Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(DEPTH_PASS_UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cascade Shadow Pipeline Layout"),
            bind_group_layouts: &[Some(&bind_group_layout)],
            immediate_size: 0,
        });

        let uniform_buffer = create_uniform_buffer(device, stride, 1);
        let bind_group = create_bind_group(device, &bind_group_layout, &uniform_buffer);

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            supported_formats,
            shader,
            bind_group_layout,
            pipeline_layout,
            pipelines: FxHashMap::default(),
            uniform_buffer,
            uniform_capacity: 1,
            uniform_stride: stride,
            bind_group,
            casters: CasterRegistry::default(),
        })
    }

    #[must_use]
    pub fn supported_formats(&self) -> &[wgpu::TextureFormat] {
        &self.supported_formats
    }

    // ========================================================================
    // Caster registry
    // ========================================================================

    pub fn add_caster(&mut self, caster: ShadowCaster) -> CasterId {
        self.casters.insert(caster)
    }

    pub fn remove_caster(&mut self, id: CasterId) -> Option<ShadowCaster> {
        self.casters.remove(id)
    }

    /// Updates the model matrix of a caster. Returns `false` for unknown ids.
    pub fn set_caster_transform(&mut self, id: CasterId, model: Mat4) -> bool {
        match self.casters.get_mut(id) {
            Some(caster) => {
                caster.model = model;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn caster(&self, id: CasterId) -> Option<&ShadowCaster> {
        self.casters.get(id)
    }

    #[must_use]
    pub fn caster_count(&self) -> usize {
        self.casters.len()
    }

    // ========================================================================
    // GPU resources
    // ========================================================================

    fn ensure_uniform_capacity(&mut self, required_count: u32) {
        if required_count <= self.uniform_capacity {
            return;
        }

        let mut capacity = self.uniform_capacity.max(1);
        while capacity < required_count {
            capacity = capacity.saturating_mul(2);
        }

        self.uniform_buffer = create_uniform_buffer(&self.device, self.uniform_stride, capacity);
        self.bind_group = create_bind_group(&self.device, &self.bind_group_layout, &self.uniform_buffer);
        self.uniform_capacity = capacity;
    }

    fn ensure_pipeline(&mut self, key: DepthPipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cascade Shadow Depth Pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: key.vertex_stride,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    }],
                }],
                compilation_options: Default::default(),
            },
            fragment: None,
            // Both faces: the y flip of some conventions reverses winding.
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: key.format,
                depth_write_enabled: Some(true),
                depth_compare: Some(key.compare),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("Created shadow depth pipeline for {key:?}");
        self.pipelines.insert(key, pipeline);
    }
}

impl ShadowBackend for WgpuShadowBackend {
    type Texture = ShadowTexture;

    fn supports_depth_format(&self, format: wgpu::TextureFormat) -> bool {
        self.supported_formats.contains(&format)
    }

    fn create_depth_texture(&mut self, desc: &DepthTextureDesc<'_>) -> ShadowTexture {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.size,
                height: desc.size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sample_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(desc.label),
            aspect: wgpu::TextureAspect::DepthOnly,
            ..Default::default()
        });

        ShadowTexture {
            texture,
            view,
            sample_view,
            format: desc.format,
            size: desc.size,
        }
    }

    fn release_depth_texture(&mut self, texture: ShadowTexture) {
        texture.texture.destroy();
    }

    fn render_depth(&mut self, request: &DepthRenderRequest<'_, ShadowTexture>) {
        let target = request.target;

        let order = select_visible(
            self.casters
                .iter()
                .map(|(id, caster)| (id, caster.layers, caster.vertex_stride)),
            request.culling,
        );

        self.ensure_uniform_capacity((order.len() as u32).max(1));
        let mut strides: Vec<wgpu::BufferAddress> = order.iter().map(|&(_, stride)| stride).collect();
        strides.dedup();
        for vertex_stride in strides {
            self.ensure_pipeline(DepthPipelineKey {
                format: target.format,
                compare: request.depth_compare,
                vertex_stride,
            });
        }

        let visible: Vec<&ShadowCaster> = order
            .iter()
            .filter_map(|&(id, _)| self.casters.get(id))
            .collect();

        let light_view_proj = request.view_projection();
        let stride = self.uniform_stride as usize;
        if !visible.is_empty() {
            let mut uniforms = vec![0u8; stride * visible.len()];
            for (slot, caster) in visible.iter().enumerate() {
                let uniform = DepthPassUniform {
                    light_view_proj,
                    model: caster.model,
                };
                let bytes = bytemuck::bytes_of(&uniform);
                let offset = slot * stride;
                uniforms[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
            self.queue.write_buffer(&self.uniform_buffer, 0, &uniforms);
        }

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Cascade Shadow Encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Cascade Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(request.clear_depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for (slot, caster) in visible.iter().enumerate() {
                let key = DepthPipelineKey {
                    format: target.format,
                    compare: request.depth_compare,
                    vertex_stride: caster.vertex_stride,
                };
                let Some(pipeline) = self.pipelines.get(&key) else {
                    continue;
                };

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.bind_group, &[slot as u32 * self.uniform_stride]);
                pass.set_vertex_buffer(0, caster.vertex_buffer.slice(..));

                if let Some(indices) = &caster.indices {
                    pass.set_index_buffer(indices.buffer.slice(..), indices.format);
                    pass.draw_indexed(0..indices.count, 0, 0..1);
                } else {
                    pass.draw(0..caster.vertex_count, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn create_uniform_buffer(device: &wgpu::Device, stride: u32, capacity: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Cascade Shadow Uniform Buffer"),
        size: u64::from(stride) * u64::from(capacity),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Cascade Shadow BindGroup"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: wgpu::BufferSize::new(DEPTH_PASS_UNIFORM_SIZE),
            }),
        }],
    })
}

pub(crate) fn align_to(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}
