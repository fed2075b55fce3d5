//! In-memory backend that records every call, for pipeline tests.

use std::collections::BTreeMap;

use glam::Mat4;

use crate::backend::{
    CompositeDraw, LightDraw, LightShape, PresentationParams, RenderBackend, SurfaceDesc,
    SurfaceId, MAX_TARGET_BINDINGS,
};
use crate::coords::ColorRgba;
use crate::error::{PenumbraError, Result};
use crate::light::TextureId;
use crate::shadow::ShadowVertex;

/// Recorded backend call. `target` is the first bound surface, `None` for
/// the back buffer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Op {
    CreateSurface(SurfaceId, SurfaceDesc),
    DestroySurface(SurfaceId),
    Bind(Vec<SurfaceId>),
    Clear { target: Option<SurfaceId>, color: ColorRgba },
    ResetOcclusion { target: Option<SurfaceId> },
    Occlusion { target: Option<SurfaceId>, vertices: usize },
    Light { target: Option<SurfaceId>, draw: LightDraw },
    Composite { target: Option<SurfaceId>, draw: CompositeDraw },
}

pub(crate) struct RecordingBackend {
    pub presentation: PresentationParams,
    pub ops: Vec<Op>,
    pub live: BTreeMap<SurfaceId, SurfaceDesc>,
    pub bindings: Vec<SurfaceId>,
    pub known_textures: Vec<TextureId>,
    pub fail_surface_creation: bool,
    next: u64,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            presentation: PresentationParams {
                width,
                height,
                color_format: wgpu::TextureFormat::Rgba8UnormSrgb,
                depth_stencil_format: Some(wgpu::TextureFormat::Depth24PlusStencil8),
                sample_count: 1,
            },
            ops: Vec::new(),
            live: BTreeMap::new(),
            bindings: Vec::new(),
            known_textures: Vec::new(),
            fail_surface_creation: false,
            next: 100,
        }
    }

    pub fn take_ops(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    fn target(&self) -> Option<SurfaceId> {
        self.bindings.first().copied()
    }
}

impl RenderBackend for RecordingBackend {
    fn presentation(&self) -> PresentationParams {
        self.presentation
    }

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<SurfaceId> {
        if self.fail_surface_creation {
            return Err(PenumbraError::SurfaceCreation {
                label: desc.label,
                reason: "out of memory".into(),
            });
        }
        let id = SurfaceId(self.next);
        self.next += 1;
        self.live.insert(id, *desc);
        self.ops.push(Op::CreateSurface(id, *desc));
        Ok(id)
    }

    fn destroy_surface(&mut self, id: SurfaceId) {
        if self.live.remove(&id).is_some() {
            self.bindings.retain(|b| *b != id);
            self.ops.push(Op::DestroySurface(id));
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
        self.bindings = targets.iter().take(MAX_TARGET_BINDINGS).copied().collect();
        self.ops.push(Op::Bind(self.bindings.clone()));
    }

    fn clear(&mut self, color: ColorRgba) {
        self.ops.push(Op::Clear { target: self.target(), color });
    }

    fn reset_occlusion(&mut self) {
        self.ops.push(Op::ResetOcclusion { target: self.target() });
    }

    fn draw_occlusion(&mut self, triangles: &[ShadowVertex], _world_to_clip: Mat4) {
        self.ops.push(Op::Occlusion {
            target: self.target(),
            vertices: triangles.len(),
        });
    }

    fn draw_light(&mut self, light: &LightDraw) -> Result<()> {
        if let LightShape::Textured { texture, .. } = light.shape {
            if !self.known_textures.contains(&texture) {
                return Err(PenumbraError::UnknownTexture(texture.0));
            }
        }
        self.ops.push(Op::Light {
            target: self.target(),
            draw: *light,
        });
        Ok(())
    }

    fn draw_composite(&mut self, composite: &CompositeDraw) {
        self.ops.push(Op::Composite {
            target: self.target(),
            draw: *composite,
        });
    }

    fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.known_textures.contains(&id).then_some((64, 64))
    }
}
