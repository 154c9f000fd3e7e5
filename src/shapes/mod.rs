//! 2D shape library used for collision, sensing and spatial queries.
//!
//! [`Shape`] is a closed enum over the supported primitives. All pairwise
//! operations go through an explicit table (see [`intersect`] and
//! [`penetration`]) so every ordered pair has exactly one implementation and
//! swapped arguments reach the same code.
//!
//! Coordinates are `f32`. Containment and intersection are closed: touching
//! shapes intersect.

pub mod geometry;
pub mod intersect;
pub mod penetration;
pub mod primitives;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use primitives::{Capsule, Circle, Compound, Point, Polygon, Segment};

/// Axis-aligned rectangle, closed on all sides.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle spanning `center ± half_extents`.
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest rectangle containing every point. Empty input yields the
    /// degenerate rectangle at the origin.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        iter.fold(Self::new(first, first), |r, p| Self::new(r.min.min(p), r.max.max(p)))
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Largest of width and height.
    pub fn longest_side(&self) -> f32 {
        self.width().max(self.height())
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn contains(&self, other: &Rect) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn expand(&self, amount: f32) -> Rect {
        Rect::new(self.min - Vec2::splat(amount), self.max + Vec2::splat(amount))
    }

    /// Corners in counter-clockwise order starting at `min`.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

/// Result of classifying a shape against a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectionType {
    None,
    Intersects,
    /// The shape covers the whole rectangle.
    Contains,
}

/// Translation followed by rotation (radians, counter-clockwise).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform2D {
    pub translation: Vec2,
    pub rotation: f32,
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        translation: Vec2::ZERO,
        rotation: 0.0,
    };

    pub fn new(translation: Vec2, rotation: f32) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Rotates `p` about the origin, then translates it.
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        self.transform_vector(p) + self.translation
    }

    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        if self.rotation == 0.0 {
            v
        } else {
            Vec2::from_angle(self.rotation).rotate(v)
        }
    }
}

/// Half-line starting at `origin` heading along `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec2,
    pub direction: Vec2,
}

impl Ray {
    pub fn new(origin: Vec2, direction: Vec2) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Vec2 {
        self.origin + self.direction * t
    }
}

/// Closed set of supported shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Point),
    Segment(Segment),
    Circle(Circle),
    Capsule(Capsule),
    Polygon(Polygon),
    Compound(Compound),
}

impl Shape {
    pub fn point(location: Vec2) -> Self {
        Shape::Point(Point::new(location))
    }

    pub fn segment(start: Vec2, end: Vec2) -> Self {
        Shape::Segment(Segment::new(start, end))
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        Shape::Circle(Circle::new(center, radius))
    }

    pub fn capsule(start: Vec2, end: Vec2, radius: f32) -> Self {
        Shape::Capsule(Capsule::new(start, end, radius))
    }

    pub fn polygon(vertices: impl IntoIterator<Item = Vec2>) -> Self {
        Shape::Polygon(Polygon::new(vertices))
    }

    pub fn rectangle(rect: &Rect) -> Self {
        Shape::Polygon(Polygon::from_rect(rect))
    }

    pub fn compound(shapes: Vec<Shape>) -> Self {
        Shape::Compound(Compound::new(shapes))
    }

    /// Short lowercase name of the variant, used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Point(_) => "point",
            Shape::Segment(_) => "segment",
            Shape::Circle(_) => "circle",
            Shape::Capsule(_) => "capsule",
            Shape::Polygon(_) => "polygon",
            Shape::Compound(_) => "compound",
        }
    }

    /// Cached bounding rectangle.
    pub fn bounds(&self) -> &Rect {
        match self {
            Shape::Point(s) => s.bounds(),
            Shape::Segment(s) => s.bounds(),
            Shape::Circle(s) => s.bounds(),
            Shape::Capsule(s) => s.bounds(),
            Shape::Polygon(s) => s.bounds(),
            Shape::Compound(s) => s.bounds(),
        }
    }

    /// Recomputes the cached bounds after in-place edits.
    pub fn update_bounds(&mut self) {
        match self {
            Shape::Point(s) => s.update_bounds(),
            Shape::Segment(s) => s.update_bounds(),
            Shape::Circle(s) => s.update_bounds(),
            Shape::Capsule(s) => s.update_bounds(),
            Shape::Polygon(s) => s.update_bounds(),
            Shape::Compound(s) => s.update_bounds(),
        }
    }

    /// Returns a transformed copy with fresh bounds.
    pub fn transform(&self, t: &Transform2D) -> Shape {
        match self {
            Shape::Point(s) => Shape::Point(s.transform(t)),
            Shape::Segment(s) => Shape::Segment(s.transform(t)),
            Shape::Circle(s) => Shape::Circle(s.transform(t)),
            Shape::Capsule(s) => Shape::Capsule(s.transform(t)),
            Shape::Polygon(s) => Shape::Polygon(s.transform(t)),
            Shape::Compound(s) => Shape::Compound(s.transform(t)),
        }
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        match self {
            Shape::Point(s) => s.contains_point(p),
            Shape::Segment(s) => s.contains_point(p),
            Shape::Circle(s) => s.contains_point(p),
            Shape::Capsule(s) => s.contains_point(p),
            Shape::Polygon(s) => s.contains_point(p),
            Shape::Compound(s) => s.contains_point(p),
        }
    }

    /// Symmetric, closed intersection test.
    pub fn intersects(&self, other: &Shape) -> bool {
        if !self.bounds().intersects(other.bounds()) {
            return false;
        }
        intersect::intersects(self, other)
    }

    /// Classifies this shape against `rect`.
    ///
    /// Every primitive is convex, so a primitive contains the rectangle
    /// exactly when it contains all four corners. A compound contains it
    /// when one of its children does.
    pub fn intersection_type(&self, rect: &Rect) -> IntersectionType {
        if !self.bounds().intersects(rect) {
            return IntersectionType::None;
        }
        if let Shape::Compound(c) = self {
            let mut result = IntersectionType::None;
            for child in &c.shapes {
                match child.intersection_type(rect) {
                    IntersectionType::Contains => return IntersectionType::Contains,
                    IntersectionType::Intersects => result = IntersectionType::Intersects,
                    IntersectionType::None => {}
                }
            }
            return result;
        }
        if rect.corners().iter().all(|c| self.contains_point(*c)) {
            return IntersectionType::Contains;
        }
        if self.intersects(&Shape::rectangle(rect)) {
            IntersectionType::Intersects
        } else {
            IntersectionType::None
        }
    }

    /// Minimal translation that, subtracted from `other`'s position,
    /// separates `other` from `self`. Zero when they do not intersect.
    pub fn penetration(&self, other: &Shape) -> Vec2 {
        if !self.bounds().intersects(other.bounds()) {
            return Vec2::ZERO;
        }
        penetration::penetration(self, other)
    }

    /// First point along `ray` that lies in the shape, if any.
    pub fn ray_intersection(&self, ray: &Ray) -> Option<Vec2> {
        self.ray_parameter(ray).map(|t| ray.at(t))
    }

    pub(crate) fn ray_parameter(&self, ray: &Ray) -> Option<f32> {
        use geometry::{ray_circle, ray_segment};
        let (o, d) = (ray.origin, ray.direction);
        match self {
            Shape::Point(p) => ray_circle(o, d, p.location, 0.0),
            Shape::Segment(s) => ray_segment(o, d, s.start, s.end),
            Shape::Circle(c) => ray_circle(o, d, c.center, c.radius),
            Shape::Capsule(c) => {
                if c.contains_point(o) {
                    return Some(0.0);
                }
                let side = (c.end - c.start).perp().normalize_or_zero() * c.radius;
                [
                    ray_circle(o, d, c.start, c.radius),
                    ray_circle(o, d, c.end, c.radius),
                    ray_segment(o, d, c.start + side, c.end + side),
                    ray_segment(o, d, c.start - side, c.end - side),
                ]
                .into_iter()
                .flatten()
                .reduce(f32::min)
            }
            Shape::Polygon(p) => {
                if p.contains_point(o) {
                    return Some(0.0);
                }
                p.edges().filter_map(|(a, b)| ray_segment(o, d, a, b)).reduce(f32::min)
            }
            Shape::Compound(c) => c
                .shapes
                .iter()
                .filter_map(|s| s.ray_parameter(ray))
                .reduce(f32::min),
        }
    }
}

impl From<Rect> for Shape {
    fn from(rect: Rect) -> Self {
        Shape::rectangle(&rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_against_segment_scenario() {
        let circle = Shape::circle(Vec2::ZERO, 1.0);
        let far = Shape::segment(Vec2::new(2.0, 0.0), Vec2::new(0.0, 2.0));
        let near = Shape::segment(Vec2::new(0.5, 0.0), Vec2::new(0.0, 0.5));
        assert!(!circle.intersects(&far));
        assert!(!far.intersects(&circle));
        assert!(circle.intersects(&near));
        assert!(near.intersects(&circle));
    }

    #[test]
    fn touching_circles_intersect() {
        let a = Shape::circle(Vec2::ZERO, 1.0);
        let b = Shape::circle(Vec2::new(2.0, 0.0), 1.0);
        assert!(a.intersects(&b));
    }

    #[test]
    fn intersection_type_with_rect() {
        let circle = Shape::circle(Vec2::ZERO, 10.0);
        let inside = Rect::new(Vec2::splat(-1.0), Vec2::splat(1.0));
        let crossing = Rect::new(Vec2::new(9.0, -1.0), Vec2::new(11.0, 1.0));
        let outside = Rect::new(Vec2::splat(20.0), Vec2::splat(21.0));
        assert_eq!(circle.intersection_type(&inside), IntersectionType::Contains);
        assert_eq!(circle.intersection_type(&crossing), IntersectionType::Intersects);
        assert_eq!(circle.intersection_type(&outside), IntersectionType::None);

        let point = Shape::point(Vec2::ZERO);
        assert_eq!(point.intersection_type(&inside), IntersectionType::Intersects);
    }

    #[test]
    fn transform_rotates_then_translates() {
        let t = Transform2D::new(Vec2::new(10.0, 0.0), std::f32::consts::PI);
        let moved = Shape::point(Vec2::new(1.0, 0.0)).transform(&t);
        let Shape::Point(p) = moved else {
            panic!("expected a point");
        };
        assert!((p.location - Vec2::new(9.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn ray_hits_nearest_compound_child() {
        let compound = Shape::compound(vec![
            Shape::circle(Vec2::new(10.0, 0.0), 1.0),
            Shape::circle(Vec2::new(5.0, 0.0), 1.0),
        ]);
        let hit = compound
            .ray_intersection(&Ray::new(Vec2::ZERO, Vec2::X))
            .unwrap();
        assert!((hit - Vec2::new(4.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn ray_into_capsule_side() {
        let capsule = Shape::capsule(Vec2::new(-5.0, 3.0), Vec2::new(5.0, 3.0), 1.0);
        let hit = capsule
            .ray_intersection(&Ray::new(Vec2::ZERO, Vec2::Y))
            .unwrap();
        assert!((hit - Vec2::new(0.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn rect_union_and_expand() {
        let a = Rect::new(Vec2::ZERO, Vec2::ONE);
        let b = Rect::new(Vec2::splat(2.0), Vec2::splat(3.0));
        let u = a.union(&b);
        assert_eq!(u, Rect::new(Vec2::ZERO, Vec2::splat(3.0)));
        assert_eq!(a.expand(1.0), Rect::new(Vec2::splat(-1.0), Vec2::splat(2.0)));
        assert!(u.contains(&a));
        assert!(!a.intersects(&Rect::new(Vec2::splat(1.5), Vec2::splat(2.0))));
    }
}
