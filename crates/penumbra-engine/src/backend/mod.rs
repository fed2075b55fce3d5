//! GPU device abstraction consumed by the render pipeline.
//!
//! The engine never talks to wgpu directly. It creates surfaces, binds them,
//! clears and issues three kinds of draws (occlusion, light, composite)
//! through [`RenderBackend`]. [`WgpuBackend`] is the production
//! implementation.
//!
//! Binding model: the backend keeps a list of bound surfaces (at most
//! [`MAX_TARGET_BINDINGS`]). An empty list means the back buffer. Clears and
//! draws go to the first bound target.

mod wgpu_backend;

#[cfg(test)]
pub(crate) mod recording;

pub use wgpu_backend::WgpuBackend;

use glam::Mat4;

use crate::coords::{ColorRgba, Vec2};
use crate::error::Result;
use crate::light::TextureId;
use crate::shadow::ShadowVertex;

/// Maximum number of simultaneously bound render targets.
pub const MAX_TARGET_BINDINGS: usize = 4;

/// Backend-assigned surface identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Back-buffer description surfaces are matched against.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PresentationParams {
    pub width: u32,
    pub height: u32,
    pub color_format: wgpu::TextureFormat,
    pub depth_stencil_format: Option<wgpu::TextureFormat>,
    pub sample_count: u32,
}

/// Offscreen surface request.
///
/// Contents are undefined after binding: whoever binds a surface clears or
/// fully overwrites it before reading.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub color_format: wgpu::TextureFormat,
    pub depth_stencil_format: Option<wgpu::TextureFormat>,
    pub sample_count: u32,
}

impl SurfaceDesc {
    /// Surface matching the back buffer.
    pub fn matching(label: &'static str, pp: &PresentationParams) -> Self {
        Self {
            label,
            width: pp.width,
            height: pp.height,
            color_format: pp.color_format,
            depth_stencil_format: pp.depth_stencil_format,
            sample_count: pp.sample_count.max(1),
        }
    }
}

/// Per-variant shape parameters of a light draw.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LightShape {
    Point,
    Spot { cone_angle: f32, decay: f32 },
    Textured { texture: TextureId, scale: Vec2 },
}

/// One light contribution.
///
/// The backend renders `shape` over the light's bounds, scaled by `color`,
/// attenuated by `1 - occlusion` accumulated since the last
/// [`RenderBackend::reset_occlusion`], and adds it to the bound target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LightDraw {
    pub position: Vec2,
    pub range: f32,
    pub rotation: f32,
    /// Linear RGB premultiplied by intensity; alpha is ignored.
    pub color: ColorRgba,
    pub shape: LightShape,
    pub world_to_clip: Mat4,
    /// Normal map to shade against, for normal-mapped lighting.
    pub normal_map: Option<NormalMapping>,
}

/// Screen-space data for normal-mapped lighting.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NormalMapping {
    pub normal_map: SurfaceId,
    /// Light center in back-buffer pixels.
    pub screen_position: Vec2,
    /// Light range in back-buffer pixels.
    pub screen_range: f32,
}

/// Final composite of the light map over the captured scene.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CompositeDraw {
    pub scene: SurfaceId,
    pub light_map: SurfaceId,
}

/// GPU device abstraction.
pub trait RenderBackend {
    /// Current back-buffer description.
    fn presentation(&self) -> PresentationParams;

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<SurfaceId>;

    /// Releases a surface. Unknown ids are ignored.
    fn destroy_surface(&mut self, id: SurfaceId);

    /// Writes the currently bound surfaces into `out` in binding order,
    /// leaving trailing slots `None`. Returns the number written; zero means
    /// the back buffer is bound.
    fn query_bindings(&self, out: &mut [Option<SurfaceId>; MAX_TARGET_BINDINGS]) -> usize;

    /// Binds `targets` (empty binds the back buffer).
    fn set_bindings(&mut self, targets: &[SurfaceId]);

    /// Clears the first bound target.
    fn clear(&mut self, color: ColorRgba);

    /// Resets the occlusion mask of the first bound target to "fully lit".
    fn reset_occlusion(&mut self);

    /// Accumulates occlusion from a triangle list with max blending.
    fn draw_occlusion(&mut self, triangles: &[ShadowVertex], world_to_clip: Mat4);

    fn draw_light(&mut self, light: &LightDraw) -> Result<()>;

    fn draw_composite(&mut self, composite: &CompositeDraw);

    /// Pixel size of a registered light texture.
    fn texture_size(&self, id: TextureId) -> Option<(u32, u32)>;
}
