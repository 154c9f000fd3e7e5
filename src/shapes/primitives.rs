//! Concrete shape primitives.
//!
//! Each primitive stores its geometry and a cached bounding [`Rect`]. The
//! cache is filled by the constructors and refreshed with `update_bounds()`
//! after the geometry fields are mutated in place.

use glam::Vec2;
use smallvec::SmallVec;

use super::geometry::{
    closest_point_on_segment, point_in_convex_polygon, point_segment_distance_squared,
    polygon_edges, signed_area2,
};
use super::{Rect, Shape, Transform2D};

/// A single location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub location: Vec2,
    bounds: Rect,
}

impl Point {
    pub fn new(location: Vec2) -> Self {
        Self {
            location,
            bounds: Rect::new(location, location),
        }
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn update_bounds(&mut self) {
        self.bounds = Rect::new(self.location, self.location);
    }

    pub fn transform(&self, t: &Transform2D) -> Self {
        Self::new(t.transform_point(self.location))
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        self.location == p
    }
}

/// A closed line segment from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
    bounds: Rect,
}

impl Segment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self {
            start,
            end,
            bounds: Rect::from_points([start, end]),
        }
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn update_bounds(&mut self) {
        self.bounds = Rect::from_points([self.start, self.end]);
    }

    pub fn transform(&self, t: &Transform2D) -> Self {
        Self::new(t.transform_point(self.start), t.transform_point(self.end))
    }

    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        closest_point_on_segment(p, self.start, self.end)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        point_segment_distance_squared(p, self.start, self.end) <= 0.0
    }
}

/// A filled disc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
    bounds: Rect,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            bounds: Rect::from_center(center, Vec2::splat(radius)),
        }
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn update_bounds(&mut self) {
        self.bounds = Rect::from_center(self.center, Vec2::splat(self.radius));
    }

    pub fn transform(&self, t: &Transform2D) -> Self {
        Self::new(t.transform_point(self.center), self.radius)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        self.center.distance_squared(p) <= self.radius * self.radius
    }
}

/// A segment swept by a disc: every point within `radius` of `start..end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    pub start: Vec2,
    pub end: Vec2,
    pub radius: f32,
    bounds: Rect,
}

impl Capsule {
    pub fn new(start: Vec2, end: Vec2, radius: f32) -> Self {
        Self {
            start,
            end,
            radius,
            bounds: Self::compute_bounds(start, end, radius),
        }
    }

    fn compute_bounds(start: Vec2, end: Vec2, radius: f32) -> Rect {
        Rect::from_points([start, end]).expand(radius)
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn update_bounds(&mut self) {
        self.bounds = Self::compute_bounds(self.start, self.end, self.radius);
    }

    pub fn transform(&self, t: &Transform2D) -> Self {
        Self::new(
            t.transform_point(self.start),
            t.transform_point(self.end),
            self.radius,
        )
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        point_segment_distance_squared(p, self.start, self.end) <= self.radius * self.radius
    }
}

/// A convex polygon with counter-clockwise vertices.
///
/// Clockwise input is reversed on construction. Convexity is checked when
/// shapes are compiled from configuration; hand-built polygons are trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: SmallVec<[Vec2; 8]>,
    bounds: Rect,
}

impl Polygon {
    pub fn new(vertices: impl IntoIterator<Item = Vec2>) -> Self {
        let mut vertices: SmallVec<[Vec2; 8]> = vertices.into_iter().collect();
        if signed_area2(&vertices) < 0.0 {
            vertices.reverse();
        }
        let bounds = Rect::from_points(vertices.iter().copied());
        Self { vertices, bounds }
    }

    /// Axis-aligned rectangle as a four-vertex polygon.
    pub fn from_rect(rect: &Rect) -> Self {
        Self::new(rect.corners())
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn update_bounds(&mut self) {
        self.bounds = Rect::from_points(self.vertices.iter().copied());
    }

    pub fn transform(&self, t: &Transform2D) -> Self {
        Self::new(self.vertices.iter().map(|v| t.transform_point(*v)))
    }

    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        polygon_edges(&self.vertices)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        point_in_convex_polygon(p, &self.vertices)
    }
}

/// An ordered group of shapes treated as their union.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub shapes: Vec<Shape>,
    bounds: Rect,
}

impl Compound {
    pub fn new(shapes: Vec<Shape>) -> Self {
        let bounds = Self::compute_bounds(&shapes);
        Self { shapes, bounds }
    }

    fn compute_bounds(shapes: &[Shape]) -> Rect {
        let mut iter = shapes.iter().map(|s| *s.bounds());
        match iter.next() {
            Some(first) => iter.fold(first, |acc, b| acc.union(&b)),
            None => Rect::default(),
        }
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    /// Refreshes the children first, then the union.
    pub fn update_bounds(&mut self) {
        for shape in &mut self.shapes {
            shape.update_bounds();
        }
        self.bounds = Self::compute_bounds(&self.shapes);
    }

    pub fn transform(&self, t: &Transform2D) -> Self {
        Self::new(self.shapes.iter().map(|s| s.transform(t)).collect())
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        self.shapes.iter().any(|s| s.contains_point(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clockwise_polygon_is_reoriented() {
        let poly = Polygon::new([
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ]);
        assert!(signed_area2(&poly.vertices) > 0.0);
        assert!(poly.contains_point(Vec2::new(0.5, 0.5)));
    }

    #[test]
    fn capsule_bounds_include_radius() {
        let cap = Capsule::new(Vec2::ZERO, Vec2::new(4.0, 0.0), 1.0);
        assert_eq!(cap.bounds().min, Vec2::new(-1.0, -1.0));
        assert_eq!(cap.bounds().max, Vec2::new(5.0, 1.0));
    }

    #[test]
    fn compound_update_bounds_refreshes_children() {
        let mut compound = Compound::new(vec![
            Shape::circle(Vec2::ZERO, 1.0),
            Shape::point(Vec2::new(5.0, 5.0)),
        ]);
        if let Shape::Circle(c) = &mut compound.shapes[0] {
            c.center = Vec2::new(-3.0, 0.0);
        }
        compound.update_bounds();
        assert_eq!(compound.bounds().min, Vec2::new(-4.0, -1.0));
        assert_eq!(compound.bounds().max, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn rotated_segment_keeps_length() {
        let seg = Segment::new(Vec2::ZERO, Vec2::new(2.0, 0.0));
        let t = Transform2D::new(Vec2::new(1.0, 1.0), std::f32::consts::FRAC_PI_2);
        let moved = seg.transform(&t);
        assert!((moved.start - Vec2::new(1.0, 1.0)).length() < 1e-6);
        assert!((moved.end - Vec2::new(1.0, 3.0)).length() < 1e-5);
    }
}
