use crate::coords::Vec2;

use super::TextureRef;

/// Which part of a hull is darkened by a light.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ShadowType {
    /// The hull interior is shadowed along with the region behind it.
    #[default]
    Solid,
    /// The hull interior stays lit; the shadow starts at its far side.
    Illuminated,
}

/// Shape and falloff of a light.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LightKind {
    /// Omnidirectional light with linear falloff to zero at the light's range.
    Point,

    /// Point falloff masked by a cone centered on the light's rotation.
    ///
    /// `cone_angle` is the full opening angle in radians. `decay` sharpens the
    /// cone edge; `0` gives a hard edge.
    Spot { cone_angle: f32, decay: f32 },

    /// Texture stretched over a `scale`-sized quad centered on the light and
    /// rotated by the light's rotation. Without a texture it renders as
    /// [`LightKind::Point`].
    Textured {
        texture: Option<TextureRef>,
        scale: Vec2,
    },
}

impl LightKind {
    /// Textured variant whose scale defaults to the texture's pixel size.
    pub fn textured(texture: Option<TextureRef>, scale: Option<Vec2>) -> Self {
        let scale = scale.unwrap_or_else(|| match texture {
            Some(t) => Vec2::new(t.width as f32, t.height as f32),
            None => Vec2::ZERO,
        });
        LightKind::Textured { texture, scale }
    }

    /// Texture backing this light, if any.
    #[inline]
    pub fn texture(&self) -> Option<TextureRef> {
        match self {
            LightKind::Textured { texture, .. } => *texture,
            _ => None,
        }
    }

    /// Linear radial falloff: 1 at the center, 0 at `range` and beyond.
    #[inline]
    pub fn point_falloff(distance: f32, range: f32) -> f32 {
        if range <= 0.0 {
            return 0.0;
        }
        (1.0 - distance / range).clamp(0.0, 1.0)
    }

    /// Angular mask of a spot cone for a direction `to_point` (need not be unit).
    pub fn cone_mask(to_point: Vec2, rotation: f32, cone_angle: f32, decay: f32) -> f32 {
        let dir = to_point.normalize_or_zero();
        if dir == Vec2::ZERO {
            return 1.0;
        }
        let (s, c) = rotation.sin_cos();
        let cos_a = dir.dot(Vec2::new(c, s));
        let cos_half = (cone_angle.clamp(0.0, std::f32::consts::TAU) * 0.5).cos();
        if cos_a < cos_half {
            return 0.0;
        }
        if decay <= 0.0 || cos_half >= 1.0 {
            return 1.0;
        }
        ((cos_a - cos_half) / (1.0 - cos_half)).clamp(0.0, 1.0).powf(decay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::TextureId;

    #[test]
    fn textured_scale_defaults_to_texture_size() {
        let tex = TextureRef::new(TextureId(7), 256, 128);
        match LightKind::textured(Some(tex), None) {
            LightKind::Textured { scale, .. } => assert_eq!(scale, Vec2::new(256.0, 128.0)),
            other => panic!("unexpected kind {other:?}"),
        }
        match LightKind::textured(Some(tex), Some(Vec2::new(10.0, 10.0))) {
            LightKind::Textured { scale, .. } => assert_eq!(scale, Vec2::new(10.0, 10.0)),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn point_falloff_is_linear_and_clamped() {
        assert_eq!(LightKind::point_falloff(0.0, 100.0), 1.0);
        assert_eq!(LightKind::point_falloff(50.0, 100.0), 0.5);
        assert_eq!(LightKind::point_falloff(150.0, 100.0), 0.0);
        assert_eq!(LightKind::point_falloff(0.0, 0.0), 0.0);
    }

    #[test]
    fn cone_mask_cuts_outside_cone() {
        let quarter = std::f32::consts::FRAC_PI_2;
        // Cone facing +X, 90° wide.
        assert_eq!(LightKind::cone_mask(Vec2::new(1.0, 0.0), 0.0, quarter, 0.0), 1.0);
        assert_eq!(LightKind::cone_mask(Vec2::new(0.0, 1.0), 0.0, quarter, 0.0), 0.0);
        let edge = LightKind::cone_mask(Vec2::new(1.0, 0.9), 0.0, quarter, 1.0);
        assert!(edge > 0.0 && edge < 1.0);
    }
}
