use crate::coords::{ColorRgba, Rect, Vec2};

use super::{LightKind, ShadowType, TextureRef};

/// A colored light source that casts shadows on hulls.
///
/// `color.a` is ignored everywhere; use `intensity` to dim a light.
///
/// `source_radius` is the apparent radius of the emitter. It only controls
/// penumbra width and is independent of `range`; zero gives hard shadows.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub position: Vec2,
    /// Distance at which the light's contribution reaches zero.
    pub range: f32,
    pub color: ColorRgba,
    pub intensity: f32,
    pub enabled: bool,
    pub casts_shadows: bool,
    pub source_radius: f32,
    /// Radians; orients spot cones and textured quads.
    pub rotation: f32,
    pub shadow_type: ShadowType,
    pub kind: LightKind,
}

impl Light {
    pub fn new(kind: LightKind) -> Self {
        Self {
            position: Vec2::ZERO,
            range: 100.0,
            color: ColorRgba::white(),
            intensity: 1.0,
            enabled: true,
            casts_shadows: true,
            source_radius: 0.0,
            rotation: 0.0,
            shadow_type: ShadowType::Solid,
            kind,
        }
    }

    pub fn point(position: Vec2, range: f32, color: ColorRgba) -> Self {
        Self {
            position,
            range,
            color,
            ..Self::new(LightKind::Point)
        }
    }

    pub fn spot(position: Vec2, range: f32, color: ColorRgba, rotation: f32, cone_angle: f32) -> Self {
        Self {
            position,
            range,
            color,
            rotation,
            ..Self::new(LightKind::Spot { cone_angle, decay: 1.0 })
        }
    }

    /// Textured light. Scale defaults to the texture size; range follows the
    /// quad's half-diagonal so culling and shadow extents cover it.
    pub fn textured(position: Vec2, texture: Option<TextureRef>, scale: Option<Vec2>) -> Self {
        let kind = LightKind::textured(texture, scale);
        let mut light = Self {
            position,
            ..Self::new(kind)
        };
        if let LightKind::Textured { scale, .. } = kind {
            if scale.length() > 0.0 {
                light.range = scale.length() * 0.5;
            }
        }
        light
    }

    #[inline]
    pub fn with_source_radius(mut self, radius: f32) -> Self {
        self.source_radius = radius.max(0.0);
        self
    }

    #[inline]
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    #[inline]
    pub fn with_shadow_type(mut self, shadow_type: ShadowType) -> Self {
        self.shadow_type = shadow_type;
        self
    }

    /// Square around the light covering everything it can illuminate.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.position, self.range.max(0.0))
    }

    /// Whether the light contributes anything at all.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.enabled && self.range > 0.0 && self.intensity > 0.0 && self.position.is_finite()
    }

    /// Whether hulls need to be considered for this light.
    #[inline]
    pub fn is_shadow_relevant(&self) -> bool {
        self.is_visible() && self.casts_shadows
    }

    /// Unshadowed contribution factor at `p`, or `None` when the shape comes
    /// from a texture and can only be evaluated on the GPU.
    pub fn falloff_at(&self, p: Vec2) -> Option<f32> {
        let to_p = p - self.position;
        let radial = LightKind::point_falloff(to_p.length(), self.range) * self.intensity;
        match self.kind {
            LightKind::Point => Some(radial),
            LightKind::Spot { cone_angle, decay } => {
                Some(radial * LightKind::cone_mask(to_p, self.rotation, cone_angle, decay))
            }
            LightKind::Textured { texture: None, .. } => Some(radial),
            LightKind::Textured { texture: Some(_), .. } => None,
        }
    }
}
