//! Spatial indexing primitives for accelerating geometric queries.
//!
//! This module provides a [`Grid`] structure that partitions 3D space into uniform cells,
//! enabling **O(1)** average-case fixed-radius lookups and expanding-shell nearest-neighbor
//! searches over mesh vertices and atoms.
//!
//! Every stored item keeps its insertion slot. Query results carry that slot so callers can
//! break distance ties deterministically in favor of the item inserted first.

use super::types::Point;
use nalgebra::Vector3;

/// Sentinel value indicating the end of a linked list.
const SENTINEL: u32 = u32::MAX;

/// A uniform spatial grid that bins items into cubic cells.
///
/// # Performance
///
/// - Construction: **O(N)** where N is the number of items.
/// - Fixed-radius queries: **O(1)** average-case per query, assuming uniform distribution.
/// - Nearest queries: a handful of fixed-radius queries with a doubling radius.
#[derive(Debug, Clone)]
pub struct Grid<T> {
    /// Side length of each cubic cell.
    cell_size: f64,
    /// Minimum coordinate of the grid's bounding box.
    origin: Point,
    /// Number of cells along each dimension (x, y, z).
    dims: Vector3<usize>,
    /// Length of the padded bounding-box diagonal.
    diagonal: f64,
    /// Index of the first item in each cell. Size = num_cells.
    head: Vec<u32>,
    /// Index of the next item in the linked list. Size = num_items.
    next: Vec<u32>,
    /// Stored items with their positions, in insertion order. Size = num_items.
    items: Vec<(Point, T)>,
}

/// A single query result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<'a, T> {
    /// Insertion position of the item.
    pub slot: usize,
    /// The stored payload.
    pub item: &'a T,
    /// Euclidean distance from the query point.
    pub distance: f64,
}

impl<T> Grid<T> {
    /// Creates a new grid enclosing the provided points.
    ///
    /// # Arguments
    ///
    /// * `items` - Iterator yielding `(position, item)` pairs.
    /// * `cell_size` - The side length of each spatial bin.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is non-positive.
    pub fn new(items: impl IntoIterator<Item = (Point, T)>, cell_size: f64) -> Self {
        assert!(cell_size > 0.0, "Cell size must be positive");

        let items: Vec<(Point, T)> = items.into_iter().collect();
        let num_items = items.len();

        if num_items == 0 {
            return Self {
                cell_size,
                origin: Point::origin(),
                dims: Vector3::zeros(),
                diagonal: 0.0,
                head: Vec::new(),
                next: Vec::new(),
                items,
            };
        }

        let mut min = Point::new(f64::MAX, f64::MAX, f64::MAX);
        let mut max = Point::new(f64::MIN, f64::MIN, f64::MIN);

        for (pos, _) in &items {
            min = min.inf(pos);
            max = max.sup(pos);
        }

        let epsilon = 1e-6;
        max += Vector3::new(epsilon, epsilon, epsilon);

        let extent = max - min;
        let dims = Vector3::new(
            ((extent.x / cell_size).ceil() as usize).max(1),
            ((extent.y / cell_size).ceil() as usize).max(1),
            ((extent.z / cell_size).ceil() as usize).max(1),
        );

        let mut head = vec![SENTINEL; dims.x * dims.y * dims.z];
        let mut next = vec![SENTINEL; num_items];

        for (i, (pos, _)) in items.iter().enumerate() {
            if let Some(cell_idx) = Self::cell_index(pos, dims, min, cell_size) {
                next[i] = head[cell_idx];
                head[cell_idx] = i as u32;
            }
        }

        Self {
            cell_size,
            origin: min,
            dims,
            diagonal: extent.norm(),
            head,
            next,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the stored item at an insertion slot.
    pub fn get(&self, slot: usize) -> Option<&T> {
        self.items.get(slot).map(|(_, item)| item)
    }

    fn cell_index(pos: &Point, dims: Vector3<usize>, origin: Point, cell_size: f64) -> Option<usize> {
        if pos.x < origin.x || pos.y < origin.y || pos.z < origin.z {
            return None;
        }

        let offset = pos - origin;
        let x = (offset.x / cell_size).floor() as usize;
        let y = (offset.y / cell_size).floor() as usize;
        let z = (offset.z / cell_size).floor() as usize;

        if x >= dims.x || y >= dims.y || z >= dims.z {
            return None;
        }

        Some(x + y * dims.x + z * dims.x * dims.y)
    }

    /// Clamped grid coordinates (x, y, z) of a position.
    fn grid_coords(&self, pos: &Point) -> (usize, usize, usize) {
        let offset = pos - self.origin;
        let x = (offset.x / self.cell_size).floor() as isize;
        let y = (offset.y / self.cell_size).floor() as isize;
        let z = (offset.z / self.cell_size).floor() as isize;

        (
            x.clamp(0, (self.dims.x as isize) - 1) as usize,
            y.clamp(0, (self.dims.y as isize) - 1) as usize,
            z.clamp(0, (self.dims.z as isize) - 1) as usize,
        )
    }

    /// Iterates over the slots of all items in cells overlapping the query sphere.
    ///
    /// Candidates are not filtered by distance; use [`Grid::within`] for exact results.
    pub fn candidates<'a>(&'a self, center: &Point, radius: f64) -> Candidates<'a, T> {
        if self.items.is_empty() {
            return Candidates {
                grid: self,
                min_x: 0,
                max_x: 0,
                min_y: 0,
                max_y: 0,
                max_z: 0,
                curr_x: 0,
                curr_y: 0,
                curr_z: 1,
                curr_item_idx: SENTINEL,
            };
        }

        let reach = Vector3::new(radius, radius, radius);
        let (min_x, min_y, min_z) = self.grid_coords(&(center - reach));
        let (max_x, max_y, max_z) = self.grid_coords(&(center + reach));

        Candidates {
            grid: self,
            min_x,
            max_x,
            min_y,
            max_y,
            max_z,
            curr_x: min_x,
            curr_y: min_y,
            curr_z: min_z,
            curr_item_idx: SENTINEL,
        }
    }

    /// Iterates over all items whose distance to `center` is at most `radius`.
    ///
    /// The iteration order follows the cell layout, not insertion order.
    pub fn within<'a>(&'a self, center: &Point, radius: f64) -> impl Iterator<Item = Hit<'a, T>> + 'a {
        let center = *center;
        let radius_sq = radius * radius;
        self.candidates(&center, radius).filter_map(move |slot| {
            let (pos, item) = &self.items[slot];
            let d2 = nalgebra::distance_squared(pos, &center);
            (d2 <= radius_sq).then(|| Hit {
                slot,
                item,
                distance: d2.sqrt(),
            })
        })
    }

    /// Finds the closest item to `center` within `radius`.
    ///
    /// Equidistant items resolve to the lowest insertion slot.
    pub fn nearest_within(&self, center: &Point, radius: f64) -> Option<Hit<'_, T>> {
        self.within(center, radius).fold(None, |best, hit| match best {
            Some(b) if !closer(&hit, &b) => Some(b),
            _ => Some(hit),
        })
    }

    /// Finds the closest item to `center` with no distance bound.
    ///
    /// The search radius starts at one cell and doubles until a candidate is found. Any item
    /// closer than a candidate found within radius `r` must itself lie within `r`, so the first
    /// non-empty shell holds the exact answer. Equidistant items resolve to the lowest slot.
    /// Non-finite queries have no nearest item.
    pub fn nearest(&self, center: &Point) -> Option<Hit<'_, T>> {
        if self.items.is_empty() || !center.iter().all(|c| c.is_finite()) {
            return None;
        }

        let limit = nalgebra::distance(center, &self.origin) + self.diagonal + self.cell_size;
        let mut radius = self.cell_size;
        loop {
            if let Some(hit) = self.nearest_within(center, radius) {
                return Some(hit);
            }
            if radius > limit {
                return None;
            }
            radius *= 2.0;
        }
    }
}

fn closer<T>(a: &Hit<'_, T>, b: &Hit<'_, T>) -> bool {
    a.distance < b.distance || (a.distance == b.distance && a.slot < b.slot)
}

/// Iterator over candidate slots in the cells overlapping a query sphere.
pub struct Candidates<'a, T> {
    grid: &'a Grid<T>,
    min_x: usize,
    max_x: usize,
    min_y: usize,
    max_y: usize,
    max_z: usize,
    curr_x: usize,
    curr_y: usize,
    curr_z: usize,
    curr_item_idx: u32,
}

impl<T> Iterator for Candidates<'_, T> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.curr_item_idx != SENTINEL {
                let slot = self.curr_item_idx as usize;
                self.curr_item_idx = self.grid.next[slot];
                return Some(slot);
            }

            if self.curr_x > self.max_x {
                self.curr_x = self.min_x;
                self.curr_y += 1;
            }
            if self.curr_y > self.max_y {
                self.curr_y = self.min_y;
                self.curr_z += 1;
            }
            if self.curr_z > self.max_z {
                return None;
            }

            let cell_idx = self.curr_x
                + self.curr_y * self.grid.dims.x
                + self.curr_z * self.grid.dims.x * self.grid.dims.y;

            self.curr_x += 1;

            if cell_idx < self.grid.head.len() {
                self.curr_item_idx = self.grid.head[cell_idx];
            }
        }
    }
}
