use ahash::AHashMap;
use glam::{DVec2, I64Vec2};

use super::{Aabb, OverlappingPairCache};

#[derive(Default)]
struct Cell {
    handles: Vec<usize>,
}

impl Cell {
    const RESERVED_SIZE: usize = 4;
}

/// Boxes covering more cells than this skip the grid and are tested
/// against every other box instead.
const MAX_CELLS_PER_BOX: i64 = 16;

/// Uniform hashed grid sized to the median box.
///
/// Typical boxes touch at most 2x2 cells. A few fast balls with long swept
/// boxes end up in `oversized` rather than inflating the cell size for
/// everyone else.
struct CellGrid {
    min_pos: DVec2,
    inv_cell_size: f64,
    cells: AHashMap<I64Vec2, Cell>,
    oversized: Vec<usize>,
}

impl CellGrid {
    fn new(aabbs: &[Aabb]) -> Self {
        let min_pos = aabbs
            .iter()
            .fold(DVec2::splat(f64::INFINITY), |acc, aabb| acc.min(aabb.min));

        Self {
            min_pos,
            inv_cell_size: Self::cell_size(aabbs).recip(),
            cells: AHashMap::with_capacity(aabbs.len()),
            oversized: Vec::new(),
        }
    }

    /// Median of the box extents, falling back to the largest extent and
    /// then to one for point-like boxes.
    fn cell_size(aabbs: &[Aabb]) -> f64 {
        let mut extents: Vec<f64> = aabbs
            .iter()
            .map(|aabb| aabb.extents().max_element())
            .collect();
        if extents.is_empty() {
            return 1.0;
        }

        let mid = extents.len() / 2;
        let (_, &mut median, _) = extents.select_nth_unstable_by(mid, f64::total_cmp);
        if median > 0.0 {
            return median;
        }

        let largest = extents.iter().copied().fold(0.0, f64::max);
        if largest > 0.0 { largest } else { 1.0 }
    }

    fn get_cell_indices(&self, pos: DVec2) -> I64Vec2 {
        ((pos - self.min_pos) * self.inv_cell_size)
            .floor()
            .as_i64vec2()
    }

    fn insert(&mut self, handle: usize, aabb: &Aabb) {
        let min = self.get_cell_indices(aabb.min);
        let max = self.get_cell_indices(aabb.max);

        let span = (max - min).saturating_add(I64Vec2::ONE);
        if span.x.saturating_mul(span.y) > MAX_CELLS_PER_BOX {
            self.oversized.push(handle);
            return;
        }

        for i in min.x..=max.x {
            for j in min.y..=max.y {
                self.cells
                    .entry(I64Vec2::new(i, j))
                    .or_insert_with(|| Cell {
                        handles: Vec::with_capacity(Cell::RESERVED_SIZE),
                    })
                    .handles
                    .push(handle);
            }
        }
    }
}

pub struct GridBroadphase;

impl GridBroadphase {
    /// Every pair of box indices whose boxes overlap, sorted and with `first < second`.
    #[must_use]
    pub fn potential_overlaps(aabbs: &[Aabb]) -> Vec<(usize, usize)> {
        if aabbs.len() < 2 {
            return Vec::new();
        }

        debug_assert!(
            aabbs
                .iter()
                .all(|aabb| aabb.min.is_finite() && aabb.max.is_finite()),
            "non-finite box passed to the broad phase"
        );

        let mut grid = CellGrid::new(aabbs);
        for (handle, aabb) in aabbs.iter().enumerate() {
            grid.insert(handle, aabb);
        }

        let mut pair_cache = OverlappingPairCache::with_capacity(aabbs.len());
        for cell in grid.cells.values() {
            for (i, &handle_a) in cell.handles.iter().enumerate() {
                for &handle_b in &cell.handles[i + 1..] {
                    if aabbs[handle_a].intersects(&aabbs[handle_b]) {
                        pair_cache.add_overlapping_pair(handle_a, handle_b);
                    }
                }
            }
        }

        if !grid.oversized.is_empty() {
            log::trace!("{} oversized boxes bypass the grid", grid.oversized.len());
        }
        for &big in &grid.oversized {
            for (handle, aabb) in aabbs.iter().enumerate() {
                if handle != big && aabbs[big].intersects(aabb) {
                    pair_cache.add_overlapping_pair(big, handle);
                }
            }
        }

        pair_cache.into_sorted_pairs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(aabbs: &[Aabb]) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for i in 0..aabbs.len() {
            for j in i + 1..aabbs.len() {
                if aabbs[i].intersects(&aabbs[j]) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    #[test]
    fn matches_brute_force_on_a_lattice() {
        let mut aabbs = Vec::new();
        for i in 0..12 {
            for j in 0..9 {
                let center = DVec2::new(f64::from(i) * 1.9, f64::from(j) * 2.05);
                let radius = 1.0 + 0.05 * f64::from((i * 7 + j * 3) % 4);
                aabbs.push(Aabb::from_circle(center, radius));
            }
        }

        assert_eq!(GridBroadphase::potential_overlaps(&aabbs), brute_force(&aabbs));
    }

    #[test]
    fn degenerate_boxes_are_handled() {
        let aabbs = [
            Aabb::new(DVec2::ZERO, DVec2::ZERO),
            Aabb::new(DVec2::ZERO, DVec2::ZERO),
            Aabb::new(DVec2::ONE, DVec2::ONE),
        ];
        assert_eq!(GridBroadphase::potential_overlaps(&aabbs), vec![(0, 1)]);
    }

    #[test]
    fn single_box_has_no_pairs() {
        let aabbs = [Aabb::from_circle(DVec2::ZERO, 1.0)];
        assert!(GridBroadphase::potential_overlaps(&aabbs).is_empty());
    }

    fn sparse_lattice() -> Vec<Aabb> {
        let mut aabbs = Vec::new();
        for i in 0..20 {
            for j in 0..20 {
                let center = DVec2::new(f64::from(i) * 5.0, f64::from(j) * 5.0);
                aabbs.push(Aabb::from_circle(center, 1.0));
            }
        }
        aabbs
    }

    #[test]
    fn fast_box_does_not_inflate_cells() {
        let mut aabbs = sparse_lattice();
        // One ball sweeping diagonally across the whole lattice.
        aabbs.push(Aabb::from_swept_circle(DVec2::ZERO, DVec2::splat(95.0), 1.0));

        let mut grid = CellGrid::new(&aabbs);
        assert!((grid.inv_cell_size - 0.5).abs() < 1.0e-12);

        for (handle, aabb) in aabbs.iter().enumerate() {
            grid.insert(handle, aabb);
        }
        assert_eq!(grid.oversized, vec![aabbs.len() - 1]);
        assert!(grid.cells.values().all(|cell| cell.handles.len() <= 4));

        assert_eq!(GridBroadphase::potential_overlaps(&aabbs), brute_force(&aabbs));
    }

    #[test]
    fn several_oversized_boxes() {
        let mut aabbs = sparse_lattice();
        aabbs.push(Aabb::from_swept_circle(DVec2::ZERO, DVec2::new(95.0, 0.0), 1.0));
        aabbs.push(Aabb::from_swept_circle(DVec2::new(50.0, -5.0), DVec2::new(50.0, 95.0), 1.0));

        assert_eq!(GridBroadphase::potential_overlaps(&aabbs), brute_force(&aabbs));
    }
}
