//! World → clip-space mapping shared by every pass.

use glam::{Mat4, Vec3, Vec4};

use crate::coords::{Rect, Vec2, Viewport};

/// Camera used by the shadow, light and composite passes.
///
/// With `sprite_batch_transform_enabled` (the default) world space is pixel
/// space with a top-left origin and +Y down, and `custom` is applied on top
/// (like a 2D sprite batch's transform matrix). With it disabled, `custom`
/// must map world space straight to clip space.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub custom: Mat4,
    pub sprite_batch_transform_enabled: bool,
    viewport: Viewport,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            custom: Mat4::IDENTITY,
            sprite_batch_transform_enabled: true,
            viewport: Viewport::new(1, 1),
        }
    }
}

impl Camera {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Pixel-space orthographic projection (top-left origin, +Y down).
    pub fn pixel_projection(&self) -> Mat4 {
        let w = self.viewport.width.max(1) as f32;
        let h = self.viewport.height.max(1) as f32;
        Mat4::orthographic_rh(0.0, w, h, 0.0, -1.0, 1.0)
    }

    /// Full world → clip transform.
    pub fn world_to_clip(&self) -> Mat4 {
        if self.sprite_batch_transform_enabled {
            self.pixel_projection() * self.custom
        } else {
            self.custom
        }
    }

    /// Maps a world point to back-buffer pixels.
    pub fn world_to_screen(&self, p: Vec2) -> Vec2 {
        let clip = self.world_to_clip() * Vec4::new(p.x, p.y, 0.0, 1.0);
        let w = if clip.w.abs() > f32::EPSILON { clip.w } else { 1.0 };
        let ndc = Vec2::new(clip.x / w, clip.y / w);
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.width as f32,
            (1.0 - ndc.y) * 0.5 * self.viewport.height as f32,
        )
    }

    /// World-space bounds of the visible area, or `None` when the transform
    /// cannot be inverted (nothing can be culled then).
    pub fn visible_bounds(&self) -> Option<Rect> {
        let m = self.world_to_clip();
        if m.determinant().abs() <= f32::EPSILON * f32::EPSILON {
            return None;
        }
        let inv = m.inverse();
        let corners: Vec<Vec2> = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .into_iter()
            .map(|(x, y)| {
                let p = inv.project_point3(Vec3::new(x, y, 0.0));
                Vec2::new(p.x, p.y)
            })
            .collect();
        Rect::from_points(&corners).filter(|r| r.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_maps_pixels_to_pixels() {
        let cam = Camera::new(Viewport::new(800, 600));
        let p = cam.world_to_screen(Vec2::new(100.0, 50.0));
        assert!((p.x - 100.0).abs() < 1e-3);
        assert!((p.y - 50.0).abs() < 1e-3);
    }

    #[test]
    fn custom_translation_shifts_view() {
        let mut cam = Camera::new(Viewport::new(800, 600));
        cam.custom = Mat4::from_translation(Vec3::new(-100.0, 0.0, 0.0));
        let p = cam.world_to_screen(Vec2::new(150.0, 0.0));
        assert!((p.x - 50.0).abs() < 1e-3);

        let bounds = cam.visible_bounds().unwrap();
        assert!((bounds.min().x - 100.0).abs() < 1e-2);
        assert!((bounds.max().x - 900.0).abs() < 1e-2);
    }

    #[test]
    fn disabled_sprite_transform_uses_custom_as_clip() {
        let mut cam = Camera::new(Viewport::new(800, 600));
        cam.sprite_batch_transform_enabled = false;
        assert_eq!(cam.world_to_clip(), Mat4::IDENTITY);
        let p = cam.world_to_screen(Vec2::new(0.0, 0.0));
        assert!((p.x - 400.0).abs() < 1e-3 && (p.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn singular_transform_disables_culling() {
        let mut cam = Camera::new(Viewport::new(800, 600));
        cam.custom = Mat4::ZERO;
        assert_eq!(cam.visible_bounds(), None);
    }
}
