//! Hierarchical uniform-grid spatial index.
//!
//! The index keeps `depth` levels of square cells. Level `L` uses cells of
//! side `cell_size * 2^L`. An element lives on the lowest level whose cell
//! side is at least the longest side of its bounds (the top level when none
//! is large enough) and is registered in every cell of that level its bounds
//! overlap, and in no other cell.
//!
//! Queries walk the levels in order, the cells of each level row by row and
//! column by column, and the keys of each cell in insertion order. Each key
//! is reported at most once, after an exact shape test.
//!
//! ```ignore
//! let mut index = SpatialIndex::new(64.0, 6);
//! index.insert(ActorId(1), Shape::circle(Vec2::ZERO, 4.0));
//! let hits = index.intersecting(&Shape::point(Vec2::new(1.0, 1.0)));
//! assert_eq!(hits, vec![ActorId(1)]);
//! ```

use std::hash::Hash;

use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::shapes::geometry::ray_aabb;
use crate::shapes::{IntersectionType, Ray, Rect, Shape};

/// Cell key: level, column, row.
pub type CellKey = (u8, i32, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    level: u8,
    min: (i32, i32),
    max: (i32, i32),
}

impl CellRange {
    fn cell_count(&self) -> u64 {
        let w = (self.max.0 as i64 - self.min.0 as i64 + 1).max(0) as u64;
        let h = (self.max.1 as i64 - self.min.1 as i64 + 1).max(0) as u64;
        w.saturating_mul(h)
    }

    fn contains(&self, col: i32, row: i32) -> bool {
        col >= self.min.0 && col <= self.max.0 && row >= self.min.1 && row <= self.max.1
    }

    /// Cells in row-major order.
    fn cells(&self) -> impl Iterator<Item = CellKey> + '_ {
        (self.min.1..=self.max.1)
            .flat_map(move |row| (self.min.0..=self.max.0).map(move |col| (self.level, col, row)))
    }
}

#[derive(Debug, Clone)]
struct Element {
    shape: Shape,
    range: CellRange,
}

/// Spatial index over shapes keyed by `K`.
#[derive(Debug, Clone)]
pub struct SpatialIndex<K> {
    cell_size: f32,
    depth: u8,
    elements: FxHashMap<K, Element>,
    buckets: FxHashMap<CellKey, SmallVec<[K; 4]>>,
    /// Union of the bounds of everything inserted since the index was last
    /// empty. Only grows; used to clip queries and rays.
    extent: Option<Rect>,
}

impl<K: Copy + Eq + Hash> SpatialIndex<K> {
    /// Creates an empty index. `cell_size` is clamped to a small positive
    /// value and `depth` to at least one level.
    pub fn new(cell_size: f32, depth: u8) -> Self {
        Self {
            cell_size: cell_size.max(1e-3),
            depth: depth.max(1),
            elements: FxHashMap::default(),
            buckets: FxHashMap::default(),
            extent: None,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.elements.contains_key(&key)
    }

    pub fn shape(&self, key: K) -> Option<&Shape> {
        self.elements.get(&key).map(|e| &e.shape)
    }

    fn level_size(&self, level: u8) -> f32 {
        self.cell_size * (1u64 << level) as f32
    }

    fn level_for(&self, bounds: &Rect) -> u8 {
        let longest = bounds.longest_side();
        (0..self.depth)
            .find(|level| self.level_size(*level) >= longest)
            .unwrap_or(self.depth - 1)
    }

    fn range_at(&self, bounds: &Rect, level: u8) -> CellRange {
        let size = self.level_size(level);
        let cell = |p: Vec2| ((p.x / size).floor() as i32, (p.y / size).floor() as i32);
        CellRange {
            level,
            min: cell(bounds.min),
            max: cell(bounds.max),
        }
    }

    /// Adds `shape` under `key`. An existing entry for the key is replaced.
    pub fn insert(&mut self, key: K, shape: Shape) {
        if self.elements.contains_key(&key) {
            self.update(key, shape);
            return;
        }
        let bounds = *shape.bounds();
        let range = self.range_at(&bounds, self.level_for(&bounds));
        for cell in range.cells() {
            self.buckets.entry(cell).or_default().push(key);
        }
        self.grow_extent(&bounds);
        self.elements.insert(key, Element { shape, range });
    }

    /// Replaces the shape stored under `key`, moving it between cells as
    /// needed. Returns `false` when the key is not present.
    pub fn update(&mut self, key: K, shape: Shape) -> bool {
        let bounds = *shape.bounds();
        let range = self.range_at(&bounds, self.level_for(&bounds));
        let Some(old_range) = self.elements.get(&key).map(|e| e.range) else {
            return false;
        };
        if old_range != range {
            self.unlink(key, &old_range);
            for cell in range.cells() {
                self.buckets.entry(cell).or_default().push(key);
            }
        }
        self.grow_extent(&bounds);
        if let Some(element) = self.elements.get_mut(&key) {
            element.shape = shape;
            element.range = range;
        }
        true
    }

    /// Removes `key`, returning its shape.
    pub fn remove(&mut self, key: K) -> Option<Shape> {
        let element = self.elements.remove(&key)?;
        self.unlink(key, &element.range);
        if self.elements.is_empty() {
            self.extent = None;
        }
        Some(element.shape)
    }

    fn unlink(&mut self, key: K, range: &CellRange) {
        for cell in range.cells() {
            if let Some(bucket) = self.buckets.get_mut(&cell) {
                if let Some(pos) = bucket.iter().position(|k| *k == key) {
                    bucket.remove(pos);
                }
                if bucket.is_empty() {
                    self.buckets.remove(&cell);
                }
            }
        }
    }

    fn grow_extent(&mut self, bounds: &Rect) {
        self.extent = Some(match self.extent {
            Some(extent) => extent.union(bounds),
            None => *bounds,
        });
    }

    /// Cells a key is currently registered in, in query order.
    pub fn cells_of(&self, key: K) -> Vec<CellKey> {
        let Some(element) = self.elements.get(&key) else {
            return Vec::new();
        };
        element
            .range
            .cells()
            .filter(|cell| self.buckets.get(cell).is_some_and(|b| b.contains(&key)))
            .collect()
    }

    /// Number of buckets, across all levels, that list `key`.
    pub fn buckets_containing(&self, key: K) -> usize {
        self.buckets.values().filter(|b| b.contains(&key)).count()
    }

    /// Cells that `key` should occupy given its current shape.
    pub fn expected_cells(&self, key: K) -> Vec<CellKey> {
        self.shape(key)
            .map(|shape| {
                let bounds = shape.bounds();
                self.range_at(bounds, self.level_for(bounds)).cells().collect()
            })
            .unwrap_or_default()
    }

    /// Calls `visit` once per candidate key whose cells overlap `area`, in
    /// query order.
    fn for_each_candidate(&self, area: &Rect, mut visit: impl FnMut(K, &Shape)) {
        let Some(extent) = self.extent else {
            return;
        };
        if !extent.intersects(area) {
            return;
        }
        let clipped = Rect::new(area.min.max(extent.min), area.max.min(extent.max));
        let mut seen: FxHashSet<K> = FxHashSet::default();
        for level in 0..self.depth {
            let range = self.range_at(&clipped, level);
            let mut visit_cell = |cell: &CellKey| {
                if let Some(bucket) = self.buckets.get(cell) {
                    for key in bucket {
                        if seen.insert(*key)
                            && let Some(element) = self.elements.get(key)
                        {
                            visit(*key, &element.shape);
                        }
                    }
                }
            };
            if range.cell_count() > self.buckets.len() as u64 {
                // sparse level: sort the occupied cells instead of scanning
                let mut cells: Vec<CellKey> = self
                    .buckets
                    .keys()
                    .filter(|(l, col, row)| *l == level && range.contains(*col, *row))
                    .copied()
                    .collect();
                cells.sort_unstable_by_key(|(_, col, row)| (*row, *col));
                cells.iter().for_each(&mut visit_cell);
            } else {
                range.cells().for_each(|cell| visit_cell(&cell));
            }
        }
    }

    /// Keys whose shapes intersect `shape`.
    pub fn intersecting(&self, shape: &Shape) -> Vec<K> {
        let mut out = Vec::new();
        self.for_each_candidate(shape.bounds(), |key, candidate| {
            if candidate.intersects(shape) {
                out.push(key);
            }
        });
        out
    }

    /// Keys whose shapes touch `rect`.
    pub fn intersecting_rect(&self, rect: &Rect) -> Vec<K> {
        let mut out = Vec::new();
        self.for_each_candidate(rect, |key, candidate| {
            if candidate.intersection_type(rect) != IntersectionType::None {
                out.push(key);
            }
        });
        out
    }

    /// Nearest element hit by `ray` and the hit point. Ties go to the
    /// element found first in query order.
    pub fn ray_intersection(&self, ray: &Ray) -> Option<(K, Vec2)> {
        let extent = self.extent?;
        if ray.direction == Vec2::ZERO {
            let query = Shape::point(ray.origin);
            return self
                .intersecting(&query)
                .first()
                .map(|key| (*key, ray.origin));
        }
        let (t_enter, t_exit) = ray_aabb(ray.origin, ray.direction, extent.min, extent.max)?;
        let mut seen: FxHashSet<K> = FxHashSet::default();
        let mut best: Option<(K, f32)> = None;
        for level in 0..self.depth {
            self.walk_level(ray, level, t_enter, t_exit, |bucket, cell_t| {
                if best.is_some_and(|(_, bt)| cell_t > bt) {
                    return false;
                }
                for key in bucket {
                    if seen.insert(*key)
                        && let Some(t) = self.elements.get(key).and_then(|e| e.shape.ray_parameter(ray))
                        && best.is_none_or(|(_, bt)| t < bt)
                    {
                        best = Some((*key, t));
                    }
                }
                true
            });
        }
        best.map(|(key, t)| (key, ray.at(t)))
    }

    /// Grid traversal of one level between `t_enter` and `t_exit`. `visit`
    /// receives the keys of each crossed cell (empty for unoccupied cells)
    /// with the ray parameter at which the cell is entered, and returns
    /// `false` to stop the walk.
    fn walk_level(
        &self,
        ray: &Ray,
        level: u8,
        t_enter: f32,
        t_exit: f32,
        mut visit: impl FnMut(&[K], f32) -> bool,
    ) {
        let size = self.level_size(level);
        let (origin, dir) = (ray.origin, ray.direction);
        let start = ray.at(t_enter);
        let mut cell = ((start.x / size).floor() as i32, (start.y / size).floor() as i32);
        let step_x = if dir.x > 0.0 { 1 } else if dir.x < 0.0 { -1 } else { 0 };
        let step_y = if dir.y > 0.0 { 1 } else if dir.y < 0.0 { -1 } else { 0 };
        let next_boundary = |c: i32, step: i32| -> f32 {
            if step > 0 { (c as f32 + 1.0) * size } else { c as f32 * size }
        };
        let mut t_max_x = if step_x != 0 {
            (next_boundary(cell.0, step_x) - origin.x) / dir.x
        } else {
            f32::INFINITY
        };
        let mut t_max_y = if step_y != 0 {
            (next_boundary(cell.1, step_y) - origin.y) / dir.y
        } else {
            f32::INFINITY
        };
        let t_delta_x = if step_x != 0 { size / dir.x.abs() } else { f32::INFINITY };
        let t_delta_y = if step_y != 0 { size / dir.y.abs() } else { f32::INFINITY };

        let span = (ray.at(t_exit) - start).abs() / size;
        let max_steps = span.x.ceil() as usize + span.y.ceil() as usize + 2;
        let mut t_curr = t_enter;
        for _ in 0..max_steps {
            if t_curr > t_exit {
                break;
            }
            let bucket = self
                .buckets
                .get(&(level, cell.0, cell.1))
                .map(|b| b.as_slice())
                .unwrap_or(&[]);
            if !visit(bucket, t_curr) {
                return;
            }
            if t_max_x < t_max_y {
                cell.0 += step_x;
                t_curr = t_max_x;
                t_max_x += t_delta_x;
            } else {
                cell.1 += step_y;
                t_curr = t_max_y;
                t_max_y += t_delta_y;
            }
        }
    }
}
