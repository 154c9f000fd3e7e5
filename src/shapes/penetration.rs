//! Penetration vectors between shapes.
//!
//! Every primitive is a rounded convex piece: a convex core (one point, a
//! segment or a polygon) inflated by a radius. Two pieces are resolved with a
//! separating-axis search over the core edge normals and the
//! vertex-to-closest-feature directions. A compound contributes all of its
//! pieces and the largest resulting vector wins.

use glam::Vec2;
use smallvec::{SmallVec, smallvec};

use super::Shape;
use super::geometry::{closest_point_on_segment, polygon_edges, segment_distance_squared};

#[derive(Debug, Clone)]
struct Piece {
    core: SmallVec<[Vec2; 8]>,
    radius: f32,
}

impl Piece {
    fn edges(&self) -> SmallVec<[(Vec2, Vec2); 8]> {
        match self.core.len() {
            0 => SmallVec::new(),
            1 => smallvec![(self.core[0], self.core[0])],
            2 => smallvec![(self.core[0], self.core[1])],
            _ => polygon_edges(&self.core).collect(),
        }
    }

    fn closest_point(&self, p: Vec2) -> Option<Vec2> {
        self.edges()
            .into_iter()
            .map(|(a, b)| closest_point_on_segment(p, a, b))
            .min_by(|x, y| x.distance_squared(p).total_cmp(&y.distance_squared(p)))
    }

    fn contains_core_point(&self, p: Vec2) -> bool {
        self.core.len() >= 3 && super::geometry::point_in_convex_polygon(p, &self.core)
    }

    fn project(&self, axis: Vec2) -> (f32, f32) {
        let (lo, hi) = self
            .core
            .iter()
            .map(|v| v.dot(axis))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(d), hi.max(d))
            });
        (lo - self.radius, hi + self.radius)
    }
}

fn pieces(shape: &Shape, out: &mut Vec<Piece>) {
    match shape {
        Shape::Point(p) => out.push(Piece {
            core: smallvec![p.location],
            radius: 0.0,
        }),
        Shape::Segment(s) => out.push(Piece {
            core: smallvec![s.start, s.end],
            radius: 0.0,
        }),
        Shape::Circle(c) => out.push(Piece {
            core: smallvec![c.center],
            radius: c.radius,
        }),
        Shape::Capsule(c) => out.push(Piece {
            core: smallvec![c.start, c.end],
            radius: c.radius,
        }),
        Shape::Polygon(p) => out.push(Piece {
            core: p.vertices.clone(),
            radius: 0.0,
        }),
        Shape::Compound(c) => {
            for child in &c.shapes {
                pieces(child, out);
            }
        }
    }
}

/// Squared distance between two cores, zero when they overlap.
fn core_distance_squared(a: &Piece, b: &Piece) -> f32 {
    if a.core.iter().any(|v| b.contains_core_point(*v))
        || b.core.iter().any(|v| a.contains_core_point(*v))
    {
        return 0.0;
    }
    let b_edges = b.edges();
    a.edges()
        .iter()
        .flat_map(|(p, q)| b_edges.iter().map(move |(r, s)| segment_distance_squared(*p, *q, *r, *s)))
        .fold(f32::INFINITY, f32::min)
}

fn candidate_axes(a: &Piece, b: &Piece) -> SmallVec<[Vec2; 16]> {
    let mut axes: SmallVec<[Vec2; 16]> = SmallVec::new();
    for piece in [a, b] {
        if piece.core.len() >= 2 {
            for (p, q) in piece.edges() {
                let n = (q - p).perp().normalize_or_zero();
                if n != Vec2::ZERO {
                    axes.push(n);
                }
            }
        }
    }
    for (from, to) in [(a, b), (b, a)] {
        for v in &from.core {
            if let Some(c) = to.closest_point(*v) {
                let n = (c - *v).normalize_or_zero();
                if n != Vec2::ZERO {
                    axes.push(n);
                }
            }
        }
    }
    if axes.is_empty() {
        axes.push(Vec2::X);
    }
    axes
}

/// Vector to subtract from `b` so that it no longer overlaps `a`.
fn piece_penetration(a: &Piece, b: &Piece) -> Vec2 {
    let reach = a.radius + b.radius;
    if core_distance_squared(a, b) > reach * reach {
        return Vec2::ZERO;
    }
    let mut best = Vec2::ZERO;
    let mut best_depth = f32::INFINITY;
    for n in candidate_axes(a, b) {
        let (amin, amax) = a.project(n);
        let (bmin, bmax) = b.project(n);
        let push_pos = amax - bmin;
        let push_neg = bmax - amin;
        if push_pos < 0.0 || push_neg < 0.0 {
            return Vec2::ZERO;
        }
        if push_pos < best_depth {
            best_depth = push_pos;
            best = -n * push_pos;
        }
        if push_neg < best_depth {
            best_depth = push_neg;
            best = n * push_neg;
        }
    }
    best
}

/// Maximum-magnitude penetration over all piece pairs of `a` and `b`.
pub fn penetration(a: &Shape, b: &Shape) -> Vec2 {
    let mut pa = Vec::new();
    let mut pb = Vec::new();
    pieces(a, &mut pa);
    pieces(b, &mut pb);
    let mut result = Vec2::ZERO;
    for x in &pa {
        for y in &pb {
            let p = piece_penetration(x, y);
            if p.length_squared() > result.length_squared() {
                result = p;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Rect;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn overlapping_circles_push_apart() {
        let a = Shape::circle(Vec2::ZERO, 1.0);
        let b = Shape::circle(Vec2::new(1.5, 0.0), 1.0);
        let p = a.penetration(&b);
        assert!(approx(p, Vec2::new(-0.5, 0.0)), "{p:?}");
        // subtracting the vector leaves them touching
        let moved = Shape::circle(Vec2::new(1.5, 0.0) - p, 1.0);
        assert!((a.penetration(&moved)).length() < 1e-4);
    }

    #[test]
    fn separated_shapes_have_zero_penetration() {
        let a = Shape::circle(Vec2::ZERO, 1.0);
        let b = Shape::circle(Vec2::new(3.0, 0.0), 1.0);
        assert_eq!(a.penetration(&b), Vec2::ZERO);
    }

    #[test]
    fn circle_resting_on_wall_is_pushed_out() {
        let wall = Shape::rectangle(&Rect::new(Vec2::new(-10.0, -1.0), Vec2::new(10.0, 0.0)));
        let ball = Shape::circle(Vec2::new(0.0, 0.75), 1.0);
        let p = wall.penetration(&ball);
        assert!(approx(p, Vec2::new(0.0, -0.25)), "{p:?}");
    }

    #[test]
    fn compound_takes_largest_piece() {
        let compound = Shape::compound(vec![
            Shape::circle(Vec2::new(-1.8, 0.0), 1.0),
            Shape::circle(Vec2::new(1.0, 0.0), 1.0),
        ]);
        let query = Shape::circle(Vec2::ZERO, 1.0);
        let p = compound.penetration(&query);
        // the right circle overlaps by 1.0, the left one by 0.2
        assert!(approx(p, Vec2::new(1.0, 0.0)), "{p:?}");
    }
}
