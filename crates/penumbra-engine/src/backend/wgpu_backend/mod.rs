//! wgpu implementation of [`RenderBackend`].
//!
//! Frame protocol for the host:
//! 1. `begin_frame(back_buffer_view)` before any drawing,
//! 2. host draws go through [`WgpuBackend::bound_target`], which follows the
//!    bindings the lighting engine sets up,
//! 3. `finish_frame()` and submit the returned command buffer.
//!
//! Every backend operation records its own render pass into the frame
//! encoder. Per-draw buffers and bind groups are created on the spot; the
//! encoder keeps them alive until submission.

mod common;
mod pipelines;
mod surface;

use std::collections::HashMap;

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::backend::{
    CompositeDraw, LightDraw, LightShape, PresentationParams, RenderBackend, SurfaceDesc,
    SurfaceId, MAX_TARGET_BINDINGS,
};
use crate::coords::ColorRgba;
use crate::error::{PenumbraError, Result};
use crate::light::{TextureId, TextureRef};
use crate::render::RenderTarget;
use crate::shadow::ShadowVertex;

use common::{LightUniform, OcclusionVertex, TargetKey, TransformUniform};
use pipelines::Pipelines;
use surface::GpuSurface;

struct Frame {
    encoder: wgpu::CommandEncoder,
    back_buffer: wgpu::TextureView,
}

/// Resolved first bound target.
struct Attachment<'a> {
    view: &'a wgpu::TextureView,
    resolve: Option<&'a wgpu::TextureView>,
    key: TargetKey,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    presentation: PresentationParams,

    pipelines: Pipelines,
    sampler: wgpu::Sampler,
    /// 1x1 white, bound where a light has no texture or normal map.
    fallback_view: wgpu::TextureView,

    surfaces: HashMap<SurfaceId, GpuSurface>,
    next_surface: u64,
    bindings: Vec<SurfaceId>,

    textures: HashMap<TextureId, TextureRef>,
    texture_views: HashMap<TextureId, wgpu::TextureView>,
    next_texture: u64,

    frame: Option<Frame>,
}

impl WgpuBackend {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, presentation: PresentationParams) -> Self {
        let pipelines = Pipelines::new(device);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("penumbra linear sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let fallback = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("penumbra fallback texture"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[255, 255, 255, 255],
        );
        let fallback_view = fallback.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            device: device.clone(),
            queue: queue.clone(),
            presentation,
            pipelines,
            sampler,
            fallback_view,
            surfaces: HashMap::new(),
            next_surface: 0,
            bindings: Vec::new(),
            textures: HashMap::new(),
            texture_views: HashMap::new(),
            next_texture: 0,
            frame: None,
        }
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Updates the back-buffer size after the host reconfigured its surface.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.presentation.width = width;
        self.presentation.height = height;
    }

    /// Makes `texture` available to textured lights.
    pub fn register_texture(&mut self, texture: &wgpu::Texture) -> TextureRef {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        let tex = TextureRef::new(id, texture.width(), texture.height());
        self.textures.insert(id, tex);
        self.texture_views
            .insert(id, texture.create_view(&wgpu::TextureViewDescriptor::default()));
        tex
    }

    /// Registration record of a texture, if still registered.
    pub fn texture(&self, id: TextureId) -> Option<TextureRef> {
        self.textures.get(&id).copied()
    }

    pub fn unregister_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
        self.texture_views.remove(&id);
    }

    /// Starts recording a frame that ends up in `back_buffer`.
    pub fn begin_frame(&mut self, back_buffer: wgpu::TextureView) {
        if self.frame.is_some() {
            log::warn!("begin_frame called twice; previous frame commands are discarded");
        }
        let encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("penumbra frame encoder"),
        });
        self.frame = Some(Frame { encoder, back_buffer });
    }

    /// Finishes the frame; the host submits the result.
    pub fn finish_frame(&mut self) -> Option<wgpu::CommandBuffer> {
        self.frame.take().map(|f| f.encoder.finish())
    }

    /// Encoder and views of the first bound target, for host drawing.
    pub fn bound_target(&mut self) -> Option<RenderTarget<'_>> {
        let frame = self.frame.as_mut()?;
        match self.bindings.first() {
            None => Some(RenderTarget {
                encoder: &mut frame.encoder,
                color_view: &frame.back_buffer,
                resolve_target: None,
                depth_view: None,
                format: self.presentation.color_format,
                sample_count: 1,
            }),
            Some(id) => {
                let surface = self.surfaces.get(id)?;
                let (view, resolve) = surface.attachment();
                Some(RenderTarget {
                    encoder: &mut frame.encoder,
                    color_view: view,
                    resolve_target: resolve,
                    depth_view: surface.depth_view(),
                    format: surface.desc.color_format,
                    sample_count: surface.sample_count(),
                })
            }
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn sample_view(&self, id: SurfaceId) -> &wgpu::TextureView {
        self.surfaces
            .get(&id)
            .map_or(&self.fallback_view, |s| &s.color_view)
    }
}

/// Splits the frame encoder from the resolved first bound target.
fn resolve_target<'a>(
    frame: &'a mut Option<Frame>,
    bindings: &[SurfaceId],
    surfaces: &'a HashMap<SurfaceId, GpuSurface>,
    presentation: &PresentationParams,
) -> Option<(&'a mut wgpu::CommandEncoder, Attachment<'a>)> {
    let Some(frame) = frame.as_mut() else {
        log::warn!("penumbra draw issued outside begin_frame/finish_frame; skipped");
        return None;
    };
    let attachment = match bindings.first() {
        None => Attachment {
            view: &frame.back_buffer,
            resolve: None,
            key: TargetKey {
                format: presentation.color_format,
                sample_count: 1,
            },
        },
        Some(id) => {
            let Some(surface) = surfaces.get(id) else {
                log::warn!("bound surface {id:?} no longer exists; draw skipped");
                return None;
            };
            let (view, resolve) = surface.attachment();
            Attachment {
                view,
                resolve,
                key: TargetKey {
                    format: surface.desc.color_format,
                    sample_count: surface.sample_count(),
                },
            }
        }
    };
    Some((&mut frame.encoder, attachment))
}

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &'static str,
    attachment: &Attachment<'_>,
    load: wgpu::LoadOp<wgpu::Color>,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: attachment.view,
            resolve_target: attachment.resolve,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}

impl RenderBackend for WgpuBackend {
    fn presentation(&self) -> PresentationParams {
        self.presentation
    }

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<SurfaceId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(PenumbraError::SurfaceCreation {
                label: desc.label,
                reason: format!("zero-sized surface {}x{}", desc.width, desc.height),
            });
        }
        let max = self.device.limits().max_texture_dimension_2d;
        if desc.width > max || desc.height > max {
            return Err(PenumbraError::SurfaceCreation {
                label: desc.label,
                reason: format!("{}x{} exceeds the device limit of {max}", desc.width, desc.height),
            });
        }

        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.surfaces.insert(id, GpuSurface::new(&self.device, desc));
        Ok(id)
    }

    fn destroy_surface(&mut self, id: SurfaceId) {
        if let Some(surface) = self.surfaces.remove(&id) {
            self.bindings.retain(|b| *b != id);
            surface.destroy();
        }
    }

    fn query_bindings(&self, out: &mut [Option<SurfaceId>; MAX_TARGET_BINDINGS]) -> usize {
        out.fill(None);
        for (slot, id) in out.iter_mut().zip(&self.bindings) {
            *slot = Some(*id);
        }
        self.bindings.len().min(MAX_TARGET_BINDINGS)
    }

    fn set_bindings(&mut self, targets: &[SurfaceId]) {
        self.bindings.clear();
        self.bindings
            .extend(targets.iter().take(MAX_TARGET_BINDINGS).copied());
    }

    fn clear(&mut self, color: ColorRgba) {
        let Self { frame, bindings, surfaces, presentation, .. } = self;
        let Some((encoder, attachment)) = resolve_target(frame, bindings, surfaces, presentation)
        else {
            return;
        };
        let _pass = begin_pass(
            encoder,
            "penumbra clear pass",
            &attachment,
            wgpu::LoadOp::Clear(color.to_wgpu()),
        );
    }

    fn reset_occlusion(&mut self) {
        let Self { device, frame, bindings, surfaces, presentation, pipelines, .. } = self;
        let Some((encoder, attachment)) = resolve_target(frame, bindings, surfaces, presentation)
        else {
            return;
        };
        let pipeline = &pipelines.ensure(device, attachment.key).reset;
        let mut rpass = begin_pass(encoder, "penumbra occlusion reset pass", &attachment, wgpu::LoadOp::Load);
        rpass.set_pipeline(pipeline);
        rpass.draw(0..3, 0..1);
    }

    fn draw_occlusion(&mut self, triangles: &[ShadowVertex], world_to_clip: Mat4) {
        if triangles.len() < 3 {
            return;
        }
        let vertices: Vec<OcclusionVertex> = triangles.iter().map(OcclusionVertex::from).collect();
        let vbo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("penumbra occlusion vbo"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ubo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("penumbra occlusion ubo"),
            contents: bytemuck::bytes_of(&TransformUniform::new(world_to_clip)),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("penumbra occlusion bind group"),
            layout: &self.pipelines.transform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        let Self { device, frame, bindings, surfaces, presentation, pipelines, .. } = self;
        let Some((encoder, attachment)) = resolve_target(frame, bindings, surfaces, presentation)
        else {
            return;
        };
        let pipeline = &pipelines.ensure(device, attachment.key).occlusion;
        let mut rpass = begin_pass(encoder, "penumbra occlusion pass", &attachment, wgpu::LoadOp::Load);
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.draw(0..vertices.len() as u32, 0..1);
    }

    fn draw_light(&mut self, light: &LightDraw) -> Result<()> {
        let light_view = match light.shape {
            LightShape::Textured { texture, .. } => self
                .texture_views
                .get(&texture)
                .ok_or(PenumbraError::UnknownTexture(texture.0))?,
            _ => &self.fallback_view,
        };
        let normal_view = match light.normal_map {
            Some(n) => self.sample_view(n.normal_map),
            None => &self.fallback_view,
        };

        let ubo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("penumbra light ubo"),
            contents: bytemuck::bytes_of(&LightUniform::from(light)),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("penumbra light bind group"),
            layout: &self.pipelines.light_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(light_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(normal_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let Self { device, frame, bindings, surfaces, presentation, pipelines, .. } = self;
        let Some((encoder, attachment)) = resolve_target(frame, bindings, surfaces, presentation)
        else {
            return Ok(());
        };
        let pipeline = &pipelines.ensure(device, attachment.key).light;
        let mut rpass = begin_pass(encoder, "penumbra light pass", &attachment, wgpu::LoadOp::Load);
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.draw(0..6, 0..1);
        Ok(())
    }

    fn draw_composite(&mut self, composite: &CompositeDraw) {
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("penumbra composite bind group"),
            layout: &self.pipelines.composite_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(self.sample_view(composite.scene)),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(
                        self.sample_view(composite.light_map),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let Self { device, frame, bindings, surfaces, presentation, pipelines, .. } = self;
        let Some((encoder, attachment)) = resolve_target(frame, bindings, surfaces, presentation)
        else {
            return;
        };
        let pipeline = &pipelines.ensure(device, attachment.key).composite;
        let mut rpass = begin_pass(encoder, "penumbra composite pass", &attachment, wgpu::LoadOp::Load);
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }

    fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&id).map(|t| (t.width, t.height))
    }
}
