//! Pairwise intersection table.
//!
//! Variants are ordered Point < Segment < Circle < Capsule < Polygon <
//! Compound. The 21 pairs with `a <= b` have a function each; the other 15
//! arms swap their arguments and call the same function, so
//! `intersects(a, b) == intersects(b, a)` for every pair.

use glam::Vec2;

use super::geometry::{point_segment_distance_squared, segment_distance_squared, segments_intersect};
use super::{Capsule, Circle, Compound, Point, Polygon, Segment, Shape};

pub fn intersects(a: &Shape, b: &Shape) -> bool {
    use Shape as S;
    match (a, b) {
        (S::Point(a), S::Point(b)) => point_point(a, b),
        (S::Point(a), S::Segment(b)) => point_segment(a, b),
        (S::Point(a), S::Circle(b)) => point_circle(a, b),
        (S::Point(a), S::Capsule(b)) => point_capsule(a, b),
        (S::Point(a), S::Polygon(b)) => point_polygon(a, b),
        (S::Point(_), S::Compound(b)) => compound_any(b, a),

        (S::Segment(a), S::Point(b)) => point_segment(b, a),
        (S::Segment(a), S::Segment(b)) => segment_segment(a, b),
        (S::Segment(a), S::Circle(b)) => segment_circle(a, b),
        (S::Segment(a), S::Capsule(b)) => segment_capsule(a, b),
        (S::Segment(a), S::Polygon(b)) => segment_polygon(a, b),
        (S::Segment(_), S::Compound(b)) => compound_any(b, a),

        (S::Circle(a), S::Point(b)) => point_circle(b, a),
        (S::Circle(a), S::Segment(b)) => segment_circle(b, a),
        (S::Circle(a), S::Circle(b)) => circle_circle(a, b),
        (S::Circle(a), S::Capsule(b)) => circle_capsule(a, b),
        (S::Circle(a), S::Polygon(b)) => circle_polygon(a, b),
        (S::Circle(_), S::Compound(b)) => compound_any(b, a),

        (S::Capsule(a), S::Point(b)) => point_capsule(b, a),
        (S::Capsule(a), S::Segment(b)) => segment_capsule(b, a),
        (S::Capsule(a), S::Circle(b)) => circle_capsule(b, a),
        (S::Capsule(a), S::Capsule(b)) => capsule_capsule(a, b),
        (S::Capsule(a), S::Polygon(b)) => capsule_polygon(a, b),
        (S::Capsule(_), S::Compound(b)) => compound_any(b, a),

        (S::Polygon(a), S::Point(b)) => point_polygon(b, a),
        (S::Polygon(a), S::Segment(b)) => segment_polygon(b, a),
        (S::Polygon(a), S::Circle(b)) => circle_polygon(b, a),
        (S::Polygon(a), S::Capsule(b)) => capsule_polygon(b, a),
        (S::Polygon(a), S::Polygon(b)) => polygon_polygon(a, b),
        (S::Polygon(_), S::Compound(b)) => compound_any(b, a),

        (S::Compound(a), S::Point(_)) => compound_any(a, b),
        (S::Compound(a), S::Segment(_)) => compound_any(a, b),
        (S::Compound(a), S::Circle(_)) => compound_any(a, b),
        (S::Compound(a), S::Capsule(_)) => compound_any(a, b),
        (S::Compound(a), S::Polygon(_)) => compound_any(a, b),
        (S::Compound(a), S::Compound(b)) => compound_compound(a, b),
    }
}

// In the compound arms the non-compound side is still the outer `&Shape`.
fn compound_any(compound: &Compound, other: &Shape) -> bool {
    compound.shapes.iter().any(|s| s.intersects(other))
}

fn compound_compound(a: &Compound, b: &Compound) -> bool {
    a.shapes
        .iter()
        .any(|sa| b.shapes.iter().any(|sb| sa.intersects(sb)))
}

fn point_point(a: &Point, b: &Point) -> bool {
    a.location == b.location
}

fn point_segment(a: &Point, b: &Segment) -> bool {
    b.contains_point(a.location)
}

fn point_circle(a: &Point, b: &Circle) -> bool {
    b.contains_point(a.location)
}

fn point_capsule(a: &Point, b: &Capsule) -> bool {
    b.contains_point(a.location)
}

fn point_polygon(a: &Point, b: &Polygon) -> bool {
    b.contains_point(a.location)
}

fn segment_segment(a: &Segment, b: &Segment) -> bool {
    segments_intersect(a.start, a.end, b.start, b.end)
}

fn segment_circle(a: &Segment, b: &Circle) -> bool {
    point_segment_distance_squared(b.center, a.start, a.end) <= b.radius * b.radius
}

fn segment_capsule(a: &Segment, b: &Capsule) -> bool {
    segment_distance_squared(a.start, a.end, b.start, b.end) <= b.radius * b.radius
}

fn segment_polygon(a: &Segment, b: &Polygon) -> bool {
    b.contains_point(a.start)
        || b.edges()
            .any(|(p, q)| segments_intersect(a.start, a.end, p, q))
}

fn circle_circle(a: &Circle, b: &Circle) -> bool {
    let r = a.radius + b.radius;
    a.center.distance_squared(b.center) <= r * r
}

fn circle_capsule(a: &Circle, b: &Capsule) -> bool {
    let r = a.radius + b.radius;
    point_segment_distance_squared(a.center, b.start, b.end) <= r * r
}

fn circle_polygon(a: &Circle, b: &Polygon) -> bool {
    b.contains_point(a.center) || edges_within(b, a.center, a.center, a.radius)
}

fn capsule_capsule(a: &Capsule, b: &Capsule) -> bool {
    let r = a.radius + b.radius;
    segment_distance_squared(a.start, a.end, b.start, b.end) <= r * r
}

fn capsule_polygon(a: &Capsule, b: &Polygon) -> bool {
    b.contains_point(a.start) || edges_within(b, a.start, a.end, a.radius)
}

fn polygon_polygon(a: &Polygon, b: &Polygon) -> bool {
    a.vertices.first().is_some_and(|v| b.contains_point(*v))
        || b.vertices.first().is_some_and(|v| a.contains_point(*v))
        || a.edges()
            .any(|(p, q)| b.edges().any(|(r, s)| segments_intersect(p, q, r, s)))
}

/// Whether any polygon edge comes within `radius` of segment `start..end`.
fn edges_within(poly: &Polygon, start: Vec2, end: Vec2, radius: f32) -> bool {
    let r2 = radius * radius;
    poly.edges()
        .any(|(p, q)| segment_distance_squared(start, end, p, q) <= r2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Rect;

    fn zoo() -> Vec<Shape> {
        vec![
            Shape::point(Vec2::new(0.5, 0.5)),
            Shape::segment(Vec2::new(-2.0, 0.0), Vec2::new(2.0, 1.0)),
            Shape::circle(Vec2::new(1.0, 0.0), 0.75),
            Shape::capsule(Vec2::new(0.0, -1.0), Vec2::new(0.0, 2.0), 0.25),
            Shape::rectangle(&Rect::new(Vec2::ZERO, Vec2::splat(1.0))),
            Shape::compound(vec![
                Shape::circle(Vec2::new(5.0, 5.0), 0.5),
                Shape::segment(Vec2::new(0.0, 3.0), Vec2::new(3.0, 0.0)),
            ]),
            Shape::circle(Vec2::new(10.0, 10.0), 1.0),
        ]
    }

    #[test]
    fn every_pair_is_symmetric() {
        let shapes = zoo();
        for a in &shapes {
            for b in &shapes {
                assert_eq!(
                    a.intersects(b),
                    b.intersects(a),
                    "{} vs {}",
                    a.kind_name(),
                    b.kind_name()
                );
            }
        }
    }

    #[test]
    fn polygon_inside_polygon_intersects() {
        let outer = Shape::rectangle(&Rect::new(Vec2::splat(-10.0), Vec2::splat(10.0)));
        let inner = Shape::rectangle(&Rect::new(Vec2::splat(-1.0), Vec2::splat(1.0)));
        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }

    #[test]
    fn capsule_reaches_polygon_by_radius() {
        let square = Shape::rectangle(&Rect::new(Vec2::ZERO, Vec2::splat(1.0)));
        let touching = Shape::capsule(Vec2::new(1.5, -1.0), Vec2::new(1.5, 2.0), 0.5);
        let apart = Shape::capsule(Vec2::new(1.6, -1.0), Vec2::new(1.6, 2.0), 0.5);
        assert!(square.intersects(&touching));
        assert!(!square.intersects(&apart));
    }

    #[test]
    fn compound_matches_any_child() {
        let compound = Shape::compound(vec![
            Shape::point(Vec2::new(-5.0, 0.0)),
            Shape::circle(Vec2::new(5.0, 0.0), 1.0),
        ]);
        assert!(compound.intersects(&Shape::point(Vec2::new(5.5, 0.0))));
        assert!(!compound.intersects(&Shape::point(Vec2::ZERO)));
    }
}
