//! Free-standing polygon helpers.

use crate::coords::Vec2;

/// Tolerance used by the geometry code for "zero" areas and cross products.
pub const EPSILON: f32 = 1e-5;

/// Signed area (shoelace). Positive for counter-clockwise winding.
pub fn signed_area(points: &[Vec2]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for (i, &a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        acc += a.perp_dot(b);
    }
    acc * 0.5
}

#[inline]
pub fn is_counter_clockwise(points: &[Vec2]) -> bool {
    signed_area(points) > 0.0
}

/// Even-odd point-in-polygon test. Points exactly on an edge count as inside.
pub fn contains_point(points: &[Vec2], p: Vec2) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = points[i];
        let b = points[j];

        if on_segment(a, b, p) {
            return true;
        }

        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    let ab = b - a;
    let ap = p - a;
    if ab.perp_dot(ap).abs() > EPSILON * ab.length().max(1.0) {
        return false;
    }
    let t = ap.dot(ab);
    t >= 0.0 && t <= ab.length_squared()
}

/// True when every turn has the same sign (collinear runs allowed).
pub fn is_convex(points: &[Vec2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f32;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let turn = (b - a).perp_dot(c - b);
        if turn.abs() <= EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return false;
        }
    }
    true
}

/// Removes consecutive duplicates (including the closing point when it equals the first).
pub fn dedup_closed(points: &mut Vec<Vec2>) {
    points.dedup_by(|b, a| (*a - *b).length_squared() <= EPSILON * EPSILON);
    while points.len() > 1 {
        let (first, last) = (points[0], points[points.len() - 1]);
        if (first - last).length_squared() <= EPSILON * EPSILON {
            points.pop();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn area_sign_tracks_winding() {
        let mut pts = square();
        assert_eq!(signed_area(&pts), 1.0);
        pts.reverse();
        assert_eq!(signed_area(&pts), -1.0);
    }

    #[test]
    fn containment_inside_outside_and_edge() {
        let pts = square();
        assert!(contains_point(&pts, Vec2::new(0.5, 0.5)));
        assert!(contains_point(&pts, Vec2::new(1.0, 0.5)));
        assert!(!contains_point(&pts, Vec2::new(1.5, 0.5)));
        assert!(!contains_point(&pts, Vec2::new(-0.1, -0.1)));
    }

    #[test]
    fn concave_notch_is_outside() {
        // U shape opening upward.
        let u = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(3.0, 3.0),
            Vec2::new(2.0, 3.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 3.0),
            Vec2::new(0.0, 3.0),
        ];
        assert!(!is_convex(&u));
        assert!(!contains_point(&u, Vec2::new(1.5, 2.0)));
        assert!(contains_point(&u, Vec2::new(0.5, 2.0)));
    }

    #[test]
    fn convexity_ignores_collinear_points() {
        let mut pts = square();
        pts.insert(1, Vec2::new(0.5, 0.0));
        assert!(is_convex(&pts));
    }

    #[test]
    fn dedup_drops_closing_point() {
        let mut pts = square();
        pts.push(Vec2::new(0.0, 0.0));
        pts.insert(1, Vec2::new(0.0, 0.0));
        dedup_closed(&mut pts);
        assert_eq!(pts, square());
    }
}
