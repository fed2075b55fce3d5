use crate::coords::Vec2;

/// Shadow vertex.
///
/// `intensity` is the occlusion carried by the vertex (0 lit, 1 occluded).
/// `fan_weight` is 0 at a penumbra apex and 1 everywhere else; interpolating
/// `intensity * fan_weight` and `fan_weight` separately and dividing makes the
/// occlusion constant along every ray leaving the apex.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadowVertex {
    pub position: Vec2,
    pub intensity: f32,
    pub fan_weight: f32,
}

impl ShadowVertex {
    #[inline]
    pub const fn new(position: Vec2, intensity: f32, fan_weight: f32) -> Self {
        Self { position, intensity, fan_weight }
    }

    #[inline]
    pub const fn occluded(position: Vec2) -> Self {
        Self::new(position, 1.0, 1.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WedgeKind {
    /// Hard shadow, occlusion 1 everywhere.
    Umbra,
    /// Soft fringe outside a silhouette vertex.
    Penumbra,
}

/// Convex shadow polygon, vertices in fan order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowWedge {
    pub kind: WedgeKind,
    pub vertices: Vec<ShadowVertex>,
}

impl ShadowWedge {
    /// Fan triangulation around the first vertex.
    pub fn triangles(&self) -> impl Iterator<Item = [ShadowVertex; 3]> + '_ {
        let v = &self.vertices;
        (1..v.len().saturating_sub(1)).map(move |i| [v[0], v[i], v[i + 1]])
    }

    /// Absolute polygon area.
    pub fn area(&self) -> f32 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0;
        for i in 0..n {
            let a = self.vertices[i].position;
            let b = self.vertices[(i + 1) % n].position;
            acc += a.perp_dot(b);
        }
        (acc * 0.5).abs()
    }

    /// Occlusion of this wedge at `p`, or `None` when `p` is outside it.
    ///
    /// Mirrors what the occlusion shader computes per pixel.
    pub fn occlusion_at(&self, p: Vec2) -> Option<f32> {
        self.triangles().find_map(|tri| triangle_occlusion(&tri, p))
    }
}

/// Max-composed occlusion of a wedge set at `p` (0 when nothing covers it).
pub fn occlusion_at(wedges: &[ShadowWedge], p: Vec2) -> f32 {
    wedges
        .iter()
        .filter_map(|w| w.occlusion_at(p))
        .fold(0.0, f32::max)
}

fn triangle_occlusion(tri: &[ShadowVertex; 3], p: Vec2) -> Option<f32> {
    let [a, b, c] = tri;
    let (pa, pb, pc) = (a.position, b.position, c.position);
    let area = (pb - pa).perp_dot(pc - pa);
    if area.abs() <= f32::EPSILON {
        return None;
    }

    let wa = (pb - p).perp_dot(pc - p) / area;
    let wb = (pc - p).perp_dot(pa - p) / area;
    let wc = 1.0 - wa - wb;

    // Small slack so points on shared edges land in one of the triangles.
    const SLACK: f32 = -1e-5;
    if wa < SLACK || wb < SLACK || wc < SLACK {
        return None;
    }

    let weight = wa * a.fan_weight + wb * b.fan_weight + wc * c.fan_weight;
    if weight <= f32::EPSILON {
        // Apex of a fan.
        return Some(a.intensity.max(b.intensity).max(c.intensity));
    }
    let weighted = wa * a.intensity * a.fan_weight
        + wb * b.intensity * b.fan_weight
        + wc * c.intensity * c.fan_weight;
    Some((weighted / weight).clamp(0.0, 1.0))
}
