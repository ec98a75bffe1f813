// Implements an unbounded uniform spatial grid for broadphase collision detection.

use std::collections::{HashMap, HashSet};

use crate::collision::AABB;
use crate::common::config::MIN_CELL_SIZE;

/// A body whose AABB would cover more cells than this skips the grid and is
/// tested against every other entry instead.
pub const MAX_CELLS_PER_BODY: f64 = 64.0;

/// One inserted body.
#[derive(Debug, Clone, Copy)]
struct GridEntry {
    body_index: usize,
    aabb: AABB,
    immovable: bool,
}

/// Uniform grid keyed by integer cell coordinates. Cells are created on
/// demand, so the grid covers the whole plane.
#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: f64,
    inv_cell_size: f64, // 1.0 / cell_size, cached for performance
    entries: Vec<GridEntry>,
    cells: HashMap<(i64, i64), Vec<usize>>, // Cell -> entry slots
    oversized: Vec<usize>,                  // Entry slots kept off the grid

    // Reused between queries to avoid allocations
    seen_pairs: HashSet<(usize, usize)>,
}

impl SpatialGrid {
    /// Creates an empty grid with square cells of edge `cell_size`.
    pub fn new(cell_size: f64) -> Self {
        let mut grid = SpatialGrid {
            cell_size: 1.0,
            inv_cell_size: 1.0,
            entries: Vec::new(),
            cells: HashMap::new(),
            oversized: Vec::new(),
            seen_pairs: HashSet::new(),
        };
        grid.set_cell_size(cell_size);
        grid
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Changes the cell size. Only valid between queries; clears the grid.
    pub fn set_cell_size(&mut self, cell_size: f64) {
        let cell_size = if cell_size.is_nan() {
            MIN_CELL_SIZE
        } else {
            cell_size.max(MIN_CELL_SIZE)
        };
        self.cell_size = cell_size;
        self.inv_cell_size = 1.0 / cell_size;
        self.clear();
    }

    /// Number of bodies inserted since the last `clear`.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of bodies that were too large for the grid.
    pub fn oversized_count(&self) -> usize {
        self.oversized.len()
    }

    // --- Helper Methods ---

    /// Inclusive cell range `(min_col, min_row, max_col, max_row)` touched by
    /// an AABB, or None when it would exceed `MAX_CELLS_PER_BODY`.
    fn cell_range(&self, aabb: &AABB) -> Option<(i64, i64, i64, i64)> {
        let min_col = (aabb.min.x * self.inv_cell_size).floor();
        let min_row = (aabb.min.y * self.inv_cell_size).floor();
        let max_col = (aabb.max.x * self.inv_cell_size).floor();
        let max_row = (aabb.max.y * self.inv_cell_size).floor();
        let span = (max_col - min_col + 1.0) * (max_row - min_row + 1.0);
        // NaN spans fail this comparison as well
        if !(span <= MAX_CELLS_PER_BODY) {
            return None;
        }
        Some((min_col as i64, min_row as i64, max_col as i64, max_row as i64))
    }

    // --- Public API Methods ---

    /// Removes every body from the grid.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
        self.oversized.clear();
    }

    /// Inserts a body's AABB into every cell it touches.
    ///
    /// # Arguments
    /// * `body_index` - Index of the body in the world's body list.
    /// * `aabb` - The world-space AABB of the body.
    /// * `immovable` - Pairs of two immovable bodies are never reported.
    pub fn insert(&mut self, body_index: usize, aabb: AABB, immovable: bool) {
        let slot = self.entries.len();
        self.entries.push(GridEntry {
            body_index,
            aabb,
            immovable,
        });

        let Some((min_col, min_row, max_col, max_row)) = self.cell_range(&aabb) else {
            self.oversized.push(slot);
            return;
        };
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                self.cells.entry((col, row)).or_default().push(slot);
            }
        }
    }

    /// Returns every pair of inserted bodies whose AABBs overlap, as
    /// `(lower_index, higher_index)`, deduplicated and sorted ascending so the
    /// result depends only on the inserted data.
    pub fn query_potential_pairs(&mut self) -> Vec<(usize, usize)> {
        self.seen_pairs.clear();

        for slots in self.cells.values() {
            // Only need to check pairs if cell has 2 or more bodies
            if slots.len() < 2 {
                continue;
            }
            for (i, &slot_a) in slots.iter().enumerate() {
                for &slot_b in &slots[i + 1..] {
                    Self::consider(&self.entries, &mut self.seen_pairs, slot_a, slot_b);
                }
            }
        }

        for &big in &self.oversized {
            for other in 0..self.entries.len() {
                if other != big {
                    Self::consider(&self.entries, &mut self.seen_pairs, big, other);
                }
            }
        }

        let mut pairs: Vec<(usize, usize)> = self.seen_pairs.drain().collect();
        pairs.sort_unstable();
        log::trace!(
            "broad phase: {} bodies, {} cells, {} oversized, {} pairs",
            self.entries.len(),
            self.cells.len(),
            self.oversized.len(),
            pairs.len()
        );
        pairs
    }

    fn consider(
        entries: &[GridEntry],
        seen: &mut HashSet<(usize, usize)>,
        slot_a: usize,
        slot_b: usize,
    ) {
        let a = &entries[slot_a];
        let b = &entries[slot_b];
        if (a.immovable && b.immovable) || a.body_index == b.body_index {
            return;
        }
        let key = if a.body_index < b.body_index {
            (a.body_index, b.body_index)
        } else {
            (b.body_index, a.body_index)
        };
        if seen.contains(&key) {
            return;
        }
        if a.aabb.overlaps(&b.aabb) {
            seen.insert(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec2::Vec2;

    fn square(x: f64, y: f64, half: f64) -> AABB {
        AABB::from_center(Vec2::new(x, y), Vec2::splat(half))
    }

    #[test]
    fn test_grid_new() {
        let grid = SpatialGrid::new(2.0);
        assert_eq!(grid.cell_size(), 2.0);
        assert!(grid.is_empty());

        let clamped = SpatialGrid::new(-1.0);
        assert_eq!(clamped.cell_size(), MIN_CELL_SIZE);
    }

    #[test]
    fn test_cell_range() {
        let grid = SpatialGrid::new(5.0);
        let aabb = AABB::new(Vec2::new(-1.0, 1.0), Vec2::new(6.0, 4.0));
        assert_eq!(grid.cell_range(&aabb), Some((-1, 0, 1, 0)));

        let huge = AABB::new(Vec2::new(-100.0, -100.0), Vec2::new(100.0, 100.0));
        assert_eq!(grid.cell_range(&huge), None);

        let nan = AABB {
            min: Vec2::new(f64::NAN, 0.0),
            max: Vec2::new(1.0, 1.0),
        };
        assert_eq!(grid.cell_range(&nan), None);
    }

    #[test]
    fn test_insert_and_clear() {
        let mut grid = SpatialGrid::new(5.0);
        grid.insert(0, square(2.5, 2.5, 1.0), false); // One cell
        grid.insert(1, square(5.0, 5.0, 1.0), false); // Four cells
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cells.len(), 4);
        assert_eq!(grid.cells[&(0, 0)], vec![0, 1]);
        assert_eq!(grid.cells[&(1, 1)], vec![1]);

        grid.clear();
        assert!(grid.is_empty());
        assert!(grid.cells.is_empty());
    }

    #[test]
    fn test_query_potential_pairs() {
        let mut grid = SpatialGrid::new(5.0);
        grid.insert(0, square(1.5, 1.5, 0.5), false);
        grid.insert(1, square(2.0, 2.0, 0.8), false); // Overlaps 0
        grid.insert(2, square(3.5, 3.5, 0.5), false); // Same cell as 0, no overlap
        grid.insert(3, square(5.0, 5.0, 1.5), false); // Spans four cells, overlaps 2
        grid.insert(4, square(6.0, 6.0, 0.5), false); // Overlaps 3

        let pairs = grid.query_potential_pairs();
        assert_eq!(pairs, vec![(0, 1), (2, 3), (3, 4)]);
    }

    #[test]
    fn test_pairs_spanning_many_cells_reported_once() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(0, square(0.0, 0.0, 2.0), false);
        grid.insert(1, square(0.5, 0.5, 2.0), false);
        assert_eq!(grid.query_potential_pairs(), vec![(0, 1)]);
    }

    #[test]
    fn test_immovable_pairs_skipped() {
        let mut grid = SpatialGrid::new(4.0);
        grid.insert(0, square(0.0, 0.0, 1.0), true);
        grid.insert(1, square(0.5, 0.0, 1.0), true);
        grid.insert(2, square(0.0, 0.5, 1.0), false);
        assert_eq!(grid.query_potential_pairs(), vec![(0, 2), (1, 2)]);
    }

    #[test]
    fn test_oversized_body_still_paired() {
        let mut grid = SpatialGrid::new(1.0);
        let floor = AABB::new(Vec2::new(-50.0, -1.0), Vec2::new(50.0, 0.0));
        grid.insert(0, square(10.0, 0.25, 0.5), false);
        grid.insert(1, floor, true);
        grid.insert(2, square(-20.0, 5.0, 0.5), false);
        assert_eq!(grid.oversized_count(), 1);
        assert_eq!(grid.query_potential_pairs(), vec![(0, 1)]);
    }
}
