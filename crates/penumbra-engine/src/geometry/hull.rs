use crate::coords::{Rect, Vec2};
use crate::error::{PenumbraError, Result};

use super::polygon;

/// Directed hull edge `a → b` in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Edge {
    pub a: Vec2,
    pub b: Vec2,
}

impl Edge {
    #[inline]
    pub fn direction(self) -> Vec2 {
        self.b - self.a
    }
}

/// Shadow hull: a polygon outline of scene geometry impassable by light.
///
/// Points are given in local space and placed in the world through
/// `position`, `origin`, `rotation` and `scale`. World points are recomputed
/// eagerly on every transform change so the shadow pass only reads.
///
/// Winding is normalized to counter-clockwise at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Hull {
    local: Vec<Vec2>,
    world: Vec<Vec2>,
    bounds: Rect,

    position: Vec2,
    origin: Vec2,
    rotation: f32,
    scale: Vec2,

    pub enabled: bool,
}

impl Hull {
    /// Creates a hull from an outline. The closing point may be repeated.
    ///
    /// Fails with [`PenumbraError::InvalidHull`] for fewer than three distinct
    /// points or a zero-area outline.
    pub fn new(points: impl IntoIterator<Item = Vec2>) -> Result<Self> {
        let local = normalize_outline(points.into_iter().collect())?;
        let mut hull = Self {
            world: Vec::with_capacity(local.len()),
            local,
            bounds: Rect::default(),
            position: Vec2::ZERO,
            origin: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
            enabled: true,
        };
        hull.rebuild_world();
        Ok(hull)
    }

    /// Axis-aligned rectangle hull.
    pub fn rectangle(rect: Rect) -> Result<Self> {
        let r = rect.normalized();
        let (lo, hi) = (r.min(), r.max());
        Hull::new([lo, Vec2::new(hi.x, lo.y), hi, Vec2::new(lo.x, hi.y)])
    }

    /// Regular polygon approximating a circle.
    pub fn regular(center: Vec2, radius: f32, sides: usize) -> Result<Self> {
        if sides < 3 {
            return Err(PenumbraError::InvalidHull("regular hull needs at least three sides"));
        }
        let step = std::f32::consts::TAU / sides as f32;
        let points = (0..sides).map(|i| {
            let (s, c) = (i as f32 * step).sin_cos();
            center + Vec2::new(c, s) * radius
        });
        Hull::new(points)
    }

    /// World-space outline, counter-clockwise.
    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.world
    }

    #[inline]
    pub fn local_points(&self) -> &[Vec2] {
        &self.local
    }

    /// Replaces the local outline, keeping the transform.
    pub fn set_points(&mut self, points: impl IntoIterator<Item = Vec2>) -> Result<()> {
        self.local = normalize_outline(points.into_iter().collect())?;
        self.rebuild_world();
        Ok(())
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.rebuild_world();
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Vec2) {
        self.origin = origin;
        self.rebuild_world();
    }

    /// Rotation in radians around `origin`.
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
        self.rebuild_world();
    }

    #[inline]
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Sets the scale. A mirroring scale (one negative axis) flips the
    /// world-space winding, which is restored to counter-clockwise.
    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.rebuild_world();
    }

    /// Iterates world-space edges in winding order, closing edge included.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        let n = self.world.len();
        (0..n).map(move |i| Edge {
            a: self.world[i],
            b: self.world[(i + 1) % n],
        })
    }

    /// Whether `p` lies inside or on the outline.
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        self.bounds.contains(p) && polygon::contains_point(&self.world, p)
    }

    #[inline]
    pub fn is_convex(&self) -> bool {
        polygon::is_convex(&self.world)
    }

    fn rebuild_world(&mut self) {
        let (sin, cos) = self.rotation.sin_cos();
        self.world.clear();
        self.world.extend(self.local.iter().map(|&p| {
            let q = p - self.origin;
            let q = Vec2::new(q.x * self.scale.x, q.y * self.scale.y);
            let q = Vec2::new(q.x * cos - q.y * sin, q.x * sin + q.y * cos);
            q + self.position
        }));
        if polygon::signed_area(&self.world) < 0.0 {
            self.world.reverse();
        }
        self.bounds = Rect::from_points(&self.world).unwrap_or_default();
    }
}

fn normalize_outline(mut points: Vec<Vec2>) -> Result<Vec<Vec2>> {
    if points.iter().any(|p| !p.is_finite()) {
        return Err(PenumbraError::InvalidHull("outline contains non-finite points"));
    }
    polygon::dedup_closed(&mut points);
    if points.len() < 3 {
        return Err(PenumbraError::InvalidHull("outline needs at least three distinct points"));
    }
    let area = polygon::signed_area(&points);
    if area.abs() <= polygon::EPSILON {
        return Err(PenumbraError::InvalidHull("outline has zero area"));
    }
    if area < 0.0 {
        points.reverse();
    }
    Ok(points)
}
