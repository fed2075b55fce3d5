use crate::coords::Vec2;
use crate::geometry::polygon::EPSILON;
use crate::geometry::Hull;
use crate::light::{Light, ShadowType};

use super::{ShadowVertex, ShadowWedge, WedgeKind};

/// How far past the light's reach shadow geometry is extruded.
///
/// Umbra far edges are split once at the bisector, so each far chord spans
/// less than 90° as seen from the light and its midpoint stays above
/// `cos(45°)` of the extrusion radius. 1.5 keeps that above the light's reach.
const EXTRUSION_MARGIN: f32 = 1.5;

/// A silhouette vertex closer to the light than this fraction of the source
/// radius gets a clamped source radius; beyond that the outer ray would turn
/// back toward the light.
const MAX_SOURCE_FRACTION: f32 = 0.95;

/// Builds shadow wedges for one light against a set of hulls.
///
/// Convenience wrapper around [`ShadowBuilder`] that allocates a fresh output.
pub fn build_shadow_geometry<'h>(
    light: &Light,
    hulls: impl IntoIterator<Item = &'h Hull>,
) -> Vec<ShadowWedge> {
    let mut out = Vec::new();
    ShadowBuilder::new().build_into(light, hulls, &mut out);
    out
}

/// Reusable shadow builder; keeps per-edge scratch storage between calls.
#[derive(Debug, Default)]
pub struct ShadowBuilder {
    facing: Vec<bool>,
}

impl ShadowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the wedges `light` casts on `hulls` to `out`.
    ///
    /// Never fails: disabled or out-of-range hulls, hulls containing the
    /// light, and wedges without area simply contribute nothing.
    pub fn build_into<'h>(
        &mut self,
        light: &Light,
        hulls: impl IntoIterator<Item = &'h Hull>,
        out: &mut Vec<ShadowWedge>,
    ) {
        if !light.is_shadow_relevant() {
            return;
        }
        let light_bounds = light.bounds();

        for hull in hulls {
            if !hull.enabled || !hull.bounds().overlaps(light_bounds) {
                continue;
            }
            if hull.contains(light.position) {
                continue;
            }
            self.build_hull(light, hull, out);
        }
    }

    fn build_hull(&mut self, light: &Light, hull: &Hull, out: &mut Vec<ShadowWedge>) {
        let points = hull.points();
        let n = points.len();
        let p = light.position;

        self.facing.clear();
        self.facing.extend(hull.edges().map(|e| faces_light(e.a, e.b, p)));

        let reach = (light.range + light.source_radius) * EXTRUSION_MARGIN;
        let nearest_far = points.iter().map(|&v| v.distance(p)).fold(0.0f32, f32::max);
        let far_radius = nearest_far + reach;

        // Umbra: every casting edge extruded away from the light center.
        let casts = |facing: bool| match light.shadow_type {
            ShadowType::Solid => facing,
            ShadowType::Illuminated => !facing,
        };
        for (i, edge) in hull.edges().enumerate() {
            if !casts(self.facing[i]) {
                continue;
            }
            if let Some(wedge) = umbra_wedge(p, edge.a, edge.b, far_radius) {
                out.push(wedge);
            }
        }

        // Penumbra: one fan outside each silhouette vertex.
        if light.source_radius <= 0.0 {
            return;
        }
        for i in 0..n {
            let incoming = self.facing[(i + n - 1) % n];
            let outgoing = self.facing[i];
            if incoming == outgoing {
                continue;
            }
            if let Some(wedge) =
                penumbra_wedge(p, light.source_radius, points[i], incoming, far_radius)
            {
                out.push(wedge);
            }
        }
    }
}

/// Counter-clockwise edge `a → b` faces `light` when the light lies on its
/// outward (right-hand) side. Edges collinear with the light do not face it.
#[inline]
fn faces_light(a: Vec2, b: Vec2, light: Vec2) -> bool {
    (b - a).perp_dot(light - a) < 0.0
}

fn umbra_wedge(light: Vec2, a: Vec2, b: Vec2, far_radius: f32) -> Option<ShadowWedge> {
    let da = (a - light).normalize_or_zero();
    let db = (b - light).normalize_or_zero();
    if da == Vec2::ZERO || db == Vec2::ZERO {
        return None;
    }

    // Edge seen edge-on from the light: no area to shade.
    if da.perp_dot(db).abs() <= EPSILON && da.dot(db) > 0.0 {
        return None;
    }

    let bisector = (da + db).normalize_or_zero();
    let bisector = if bisector == Vec2::ZERO { da.perp() } else { bisector };

    let wedge = ShadowWedge {
        kind: WedgeKind::Umbra,
        vertices: vec![
            ShadowVertex::occluded(a),
            ShadowVertex::occluded(b),
            ShadowVertex::occluded(light + db * far_radius),
            ShadowVertex::occluded(light + bisector * far_radius),
            ShadowVertex::occluded(light + da * far_radius),
        ],
    };
    (wedge.area() > EPSILON).then_some(wedge)
}

/// `front_to_back` is true when the silhouette vertex ends a light-facing run
/// (incoming edge faces the light, outgoing edge does not).
fn penumbra_wedge(
    light: Vec2,
    source_radius: f32,
    s: Vec2,
    front_to_back: bool,
    far_radius: f32,
) -> Option<ShadowWedge> {
    let to_s = s - light;
    let dist = to_s.length();
    if dist <= EPSILON {
        return None;
    }
    let umbra_dir = to_s / dist;

    // Outward normal of the umbra ray: away from the hull at this vertex.
    let outward = if front_to_back { -umbra_dir.perp() } else { umbra_dir.perp() };

    // The outer ray starts at the extreme of the light disc on the far side.
    let radius = source_radius.min(dist * MAX_SOURCE_FRACTION);
    let outer_dir = (to_s + outward * radius).normalize_or_zero();
    if outer_dir == Vec2::ZERO {
        return None;
    }

    let length = (far_radius - dist).max(far_radius * 0.5);
    let wedge = ShadowWedge {
        kind: WedgeKind::Penumbra,
        vertices: vec![
            ShadowVertex::new(s, 1.0, 0.0),
            ShadowVertex::new(s + umbra_dir * length, 1.0, 1.0),
            ShadowVertex::new(s + outer_dir * length, 0.0, 1.0),
        ],
    };
    (wedge.area() > EPSILON).then_some(wedge)
}
