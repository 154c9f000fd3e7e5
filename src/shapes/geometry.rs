//! Low-level 2D geometry helpers shared by the shape primitives.
//!
//! Everything here works on plain `glam::Vec2` values in `f32`. Tests that
//! involve a radius compare squared distances against squared radii, so
//! boundary points count as contained.

use glam::Vec2;

/// Returns the point on segment `a..b` closest to `p`.
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let d = b - a;
    let len2 = d.length_squared();
    if len2 == 0.0 {
        return a;
    }
    let t = ((p - a).dot(d) / len2).clamp(0.0, 1.0);
    a + d * t
}

/// Squared distance from `p` to segment `a..b`.
pub fn point_segment_distance_squared(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    closest_point_on_segment(p, a, b).distance_squared(p)
}

fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

fn within_extent(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Closed segment/segment intersection test, including collinear overlap and
/// touching endpoints.
pub fn segments_intersect(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> bool {
    let d1 = orientation(b0, b1, a0);
    let d2 = orientation(b0, b1, a1);
    let d3 = orientation(a0, a1, b0);
    let d4 = orientation(a0, a1, b1);
    let straddles = |p: f32, q: f32| (p > 0.0 && q < 0.0) || (p < 0.0 && q > 0.0);
    if straddles(d1, d2) && straddles(d3, d4) {
        return true;
    }
    (d1 == 0.0 && within_extent(b0, b1, a0))
        || (d2 == 0.0 && within_extent(b0, b1, a1))
        || (d3 == 0.0 && within_extent(a0, a1, b0))
        || (d4 == 0.0 && within_extent(a0, a1, b1))
}

/// Squared distance between segments `a0..a1` and `b0..b1`.
pub fn segment_distance_squared(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> f32 {
    if segments_intersect(a0, a1, b0, b1) {
        return 0.0;
    }
    point_segment_distance_squared(a0, b0, b1)
        .min(point_segment_distance_squared(a1, b0, b1))
        .min(point_segment_distance_squared(b0, a0, a1))
        .min(point_segment_distance_squared(b1, a0, a1))
}

/// Closed containment test for a convex, counter-clockwise polygon.
pub fn point_in_convex_polygon(p: Vec2, vertices: &[Vec2]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    polygon_edges(vertices).all(|(a, b)| (b - a).perp_dot(p - a) >= 0.0)
}

/// Iterates the closed edge loop of a polygon.
pub fn polygon_edges(vertices: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| (vertices[i], vertices[(i + 1) % n]))
}

/// Twice the signed area of a polygon; positive when counter-clockwise.
pub fn signed_area2(vertices: &[Vec2]) -> f32 {
    polygon_edges(vertices).map(|(a, b)| a.perp_dot(b)).sum()
}

/// Whether the vertex loop is convex (collinear runs allowed).
pub fn is_convex(vertices: &[Vec2]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f32;
    for i in 0..n {
        let turn = orientation(vertices[i], vertices[(i + 1) % n], vertices[(i + 2) % n]);
        if turn == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// Distance along `dir` at which a ray from `origin` first touches the circle,
/// or `0.0` when the origin starts inside it.
pub fn ray_circle(origin: Vec2, dir: Vec2, center: Vec2, r: f32) -> Option<f32> {
    // Solve ||origin + t*dir - center||^2 = r^2 for t >= 0
    let m = origin - center;
    let c = m.length_squared() - r * r;
    if c <= 0.0 {
        return Some(0.0);
    }
    let a = dir.length_squared();
    if a == 0.0 {
        return None;
    }
    let b = 2.0 * m.dot(dir);
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / (2.0 * a);
    (t >= 0.0).then_some(t)
}

/// Ray parameter of the first point where the ray meets segment `a..b`.
pub fn ray_segment(origin: Vec2, dir: Vec2, a: Vec2, b: Vec2) -> Option<f32> {
    let e = b - a;
    let denom = dir.perp_dot(e);
    let ao = a - origin;
    if denom == 0.0 {
        // parallel; only collinear segments can be hit
        if ao.perp_dot(dir) != 0.0 {
            return None;
        }
        let len2 = dir.length_squared();
        if len2 == 0.0 {
            return None;
        }
        let ta = ao.dot(dir) / len2;
        let tb = (b - origin).dot(dir) / len2;
        let (lo, hi) = (ta.min(tb), ta.max(tb));
        if hi < 0.0 {
            return None;
        }
        return Some(lo.max(0.0));
    }
    let t = ao.perp_dot(e) / denom;
    let s = ao.perp_dot(dir) / denom;
    (t >= 0.0 && (0.0..=1.0).contains(&s)).then_some(t)
}

/// Slab test of a ray against an axis-aligned box. Returns the entry and
/// exit parameters, the entry clamped to zero when the origin is inside.
pub fn ray_aabb(origin: Vec2, dir: Vec2, min: Vec2, max: Vec2) -> Option<(f32, f32)> {
    let mut tmin = 0.0f32;
    let mut tmax = f32::INFINITY;
    for axis in 0..2 {
        let (o, d, lo, hi) = (origin[axis], dir[axis], min[axis], max[axis]);
        if d.abs() < f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t1 = (lo - o) * inv;
        let mut t2 = (hi - o) * inv;
        if t1 > t2 {
            core::mem::swap(&mut t1, &mut t2);
        }
        tmin = tmin.max(t1);
        tmax = tmax.min(t2);
        if tmin > tmax {
            return None;
        }
    }
    Some((tmin, tmax))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_point_clamps_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(2.0, 0.0);
        assert_eq!(closest_point_on_segment(Vec2::new(-1.0, 1.0), a, b), a);
        assert_eq!(closest_point_on_segment(Vec2::new(3.0, 1.0), a, b), b);
        assert_eq!(
            closest_point_on_segment(Vec2::new(1.0, 1.0), a, b),
            Vec2::new(1.0, 0.0)
        );
    }

    #[test]
    fn crossing_and_touching_segments_intersect() {
        assert!(segments_intersect(
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(0.0, 1.0)
        ));
        // endpoint touching
        assert!(segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0)
        ));
        assert!(!segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0)
        ));
    }

    #[test]
    fn convex_polygon_contains_boundary() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        assert!(point_in_convex_polygon(Vec2::new(0.5, 0.5), &square));
        assert!(point_in_convex_polygon(Vec2::new(1.0, 0.5), &square));
        assert!(!point_in_convex_polygon(Vec2::new(1.01, 0.5), &square));
        assert!(is_convex(&square));
        assert!(signed_area2(&square) > 0.0);
    }

    #[test]
    fn ray_hits_circle_and_box() {
        let t = ray_circle(Vec2::new(-3.0, 0.0), Vec2::X, Vec2::ZERO, 1.0).unwrap();
        assert!((t - 2.0).abs() < 1e-5);
        assert_eq!(ray_circle(Vec2::ZERO, Vec2::X, Vec2::ZERO, 1.0), Some(0.0));
        let (enter, exit) =
            ray_aabb(Vec2::new(-5.0, 0.0), Vec2::X, Vec2::splat(-1.0), Vec2::splat(1.0)).unwrap();
        assert!((enter - 4.0).abs() < 1e-5);
        assert!((exit - 6.0).abs() < 1e-5);
        assert!(ray_aabb(Vec2::new(-5.0, 2.0), Vec2::X, Vec2::splat(-1.0), Vec2::splat(1.0)).is_none());
    }

    #[test]
    fn ray_meets_segment() {
        let t = ray_segment(
            Vec2::ZERO,
            Vec2::X,
            Vec2::new(2.0, -1.0),
            Vec2::new(2.0, 1.0),
        )
        .unwrap();
        assert!((t - 2.0).abs() < 1e-6);
        assert!(ray_segment(Vec2::ZERO, -Vec2::X, Vec2::new(2.0, -1.0), Vec2::new(2.0, 1.0)).is_none());
    }
}
