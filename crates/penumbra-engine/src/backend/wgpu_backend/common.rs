//! GPU-side types and blend states shared by the lighting passes.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::backend::{LightDraw, LightShape};
use crate::shadow::ShadowVertex;

// ── blend ─────────────────────────────────────────────────────────────────

/// Occlusion accumulates in alpha with `max`, so overlapping wedges never
/// darken beyond the strongest one.
pub(super) fn occlusion_max_blend() -> wgpu::BlendState {
    let max = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Max,
    };
    wgpu::BlendState { color: max, alpha: max }
}

/// `dst.rgb += src.rgb * (1 - dst.a)`; alpha (the occlusion mask) is kept.
pub(super) fn masked_additive_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::OneMinusDstAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::Zero,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── occlusion vertex ──────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct OcclusionVertex {
    pub pos: [f32; 2],
    /// `[intensity * fan_weight, fan_weight]`
    pub occlusion: [f32; 2],
}

impl OcclusionVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OcclusionVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

impl From<&ShadowVertex> for OcclusionVertex {
    fn from(v: &ShadowVertex) -> Self {
        Self {
            pos: v.position.to_array(),
            occlusion: [v.intensity * v.fan_weight, v.fan_weight],
        }
    }
}

// ── uniforms ──────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct TransformUniform {
    pub world_to_clip: [[f32; 4]; 4],
}

impl TransformUniform {
    pub(super) fn new(m: Mat4) -> Self {
        Self { world_to_clip: m.to_cols_array_2d() }
    }
}

const KIND_POINT: f32 = 0.0;
const KIND_SPOT: f32 = 1.0;
const KIND_TEXTURED: f32 = 2.0;

/// Mirrors `LightUniform` in `light.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct LightUniform {
    pub world_to_clip: [[f32; 4]; 4],
    pub center_range: [f32; 4],
    pub color: [f32; 4],
    pub shape: [f32; 4],
    pub extent: [f32; 4],
    pub screen: [f32; 4],
}

impl From<&LightDraw> for LightUniform {
    fn from(d: &LightDraw) -> Self {
        let (kind, cone_angle, decay, half_extent) = match d.shape {
            LightShape::Point => (KIND_POINT, 0.0, 0.0, [d.range, d.range]),
            LightShape::Spot { cone_angle, decay } => {
                (KIND_SPOT, cone_angle, decay, [d.range, d.range])
            }
            LightShape::Textured { scale, .. } => {
                (KIND_TEXTURED, 0.0, 0.0, [scale.x * 0.5, scale.y * 0.5])
            }
        };
        let (normal_flag, screen_range, screen) = match d.normal_map {
            Some(n) => (1.0, n.screen_range, n.screen_position.to_array()),
            None => (0.0, 0.0, [0.0, 0.0]),
        };
        Self {
            world_to_clip: d.world_to_clip.to_cols_array_2d(),
            center_range: [d.position.x, d.position.y, d.range, d.rotation],
            color: [d.color.r, d.color.g, d.color.b, 1.0],
            shape: [kind, cone_angle, decay, normal_flag],
            extent: [half_extent[0], half_extent[1], screen_range, 0.0],
            screen: [screen[0], screen[1], 0.0, 0.0],
        }
    }
}

// ── pipeline key ──────────────────────────────────────────────────────────

/// Attachment properties a pipeline must match.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(super) struct TargetKey {
    pub format: wgpu::TextureFormat,
    pub sample_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NormalMapping;
    use crate::backend::SurfaceId;
    use crate::coords::{ColorRgba, Vec2};

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<TransformUniform>(), 64);
        assert_eq!(std::mem::size_of::<LightUniform>(), 64 + 5 * 16);
        assert_eq!(std::mem::size_of::<OcclusionVertex>(), 16);
    }

    #[test]
    fn occlusion_vertex_premultiplies_fan_weight() {
        let v = OcclusionVertex::from(&ShadowVertex::new(Vec2::new(1.0, 2.0), 0.5, 0.0));
        assert_eq!(v.pos, [1.0, 2.0]);
        assert_eq!(v.occlusion, [0.0, 0.0]);
    }

    #[test]
    fn textured_light_uses_half_scale_extent() {
        let draw = LightDraw {
            position: Vec2::new(10.0, 20.0),
            range: 50.0,
            rotation: 0.0,
            color: ColorRgba::white(),
            shape: LightShape::Textured {
                texture: crate::light::TextureId(1),
                scale: Vec2::new(64.0, 32.0),
            },
            world_to_clip: Mat4::IDENTITY,
            normal_map: Some(NormalMapping {
                normal_map: SurfaceId(3),
                screen_position: Vec2::new(5.0, 6.0),
                screen_range: 40.0,
            }),
        };
        let u = LightUniform::from(&draw);
        assert_eq!(u.extent, [32.0, 16.0, 40.0, 0.0]);
        assert_eq!(u.shape, [KIND_TEXTURED, 0.0, 0.0, 1.0]);
        assert_eq!(u.screen[..2], [5.0, 6.0]);
    }

    #[test]
    fn spot_light_packs_cone_and_decay() {
        let draw = LightDraw {
            position: Vec2::new(30.0, 40.0),
            range: 120.0,
            rotation: 1.5,
            color: ColorRgba::new(0.5, 0.25, 1.0, 0.3),
            shape: LightShape::Spot {
                cone_angle: 0.75,
                decay: 2.0,
            },
            world_to_clip: Mat4::IDENTITY,
            normal_map: None,
        };
        let u = LightUniform::from(&draw);
        assert_eq!(u.shape, [KIND_SPOT, 0.75, 2.0, 0.0]);
        assert_eq!(u.center_range, [30.0, 40.0, 120.0, 1.5]);
        assert_eq!(u.extent, [120.0, 120.0, 0.0, 0.0]);
        assert_eq!(u.color, [0.5, 0.25, 1.0, 1.0]);
    }
}
