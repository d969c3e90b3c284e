//! Uniform spatial hash grid over the simulation bounds.
//!
//! A flat row-major array of per-cell particle index lists. The grid is
//! scratch state: cleared and refilled from scratch every substep, never
//! incrementally updated. Cell lists keep ascending particle-index order
//! because the fill pass scans the pool in index order; collision-pair
//! enumeration relies on that for reproducibility.

use crate::particle::Particles;
use crate::settings::Bounds;
use glam::Vec3;

/// Map a position to a grid cell: clamp into `bounds`, remap to `[0,1)^2`,
/// scale by the grid dimensions, truncate, and clamp to the valid range.
/// Pure; positions arbitrarily far outside the bounds hash to edge cells.
#[inline]
pub fn pos_to_cell(position: Vec3, bounds: &Bounds, grid_size: (usize, usize)) -> (usize, usize) {
    let clamped = bounds.clamp(position);
    let size = bounds.size();
    let tx = (clamped.x - bounds.min.x) / size.x;
    let ty = (clamped.y - bounds.min.y) / size.y;
    let cx = ((tx * grid_size.0 as f32) as usize).min(grid_size.0 - 1);
    let cy = ((ty * grid_size.1 as f32) as usize).min(grid_size.1 - 1);
    (cx, cy)
}

/// Cell-index → particle-index lists, row-major (`index = y * width + x`).
pub struct SpatialGrid {
    pub width: usize,
    pub height: usize,
    cells: Vec<Vec<u16>>,
}

impl SpatialGrid {
    pub fn new(grid_size: (usize, usize)) -> Self {
        Self {
            width: grid_size.0,
            height: grid_size.1,
            cells: vec![Vec::new(); grid_size.0 * grid_size.1],
        }
    }

    #[inline]
    pub fn cell_index(&self, cx: usize, cy: usize) -> usize {
        cy * self.width + cx
    }

    /// Particle indices currently hashed into cell `(cx, cy)`.
    #[inline]
    pub fn cell(&self, cx: usize, cy: usize) -> &[u16] {
        &self.cells[self.cell_index(cx, cy)]
    }

    /// Clear every cell list, keeping allocations for reuse.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Rebuild from scratch: clear, then append each particle's index to its
    /// cell in ascending index order.
    pub fn rebuild(&mut self, particles: &Particles, bounds: &Bounds) {
        self.clear();
        let grid_size = (self.width, self.height);
        for (i, p) in particles.iter().enumerate() {
            let (cx, cy) = pos_to_cell(p.position, bounds, grid_size);
            let idx = self.cell_index(cx, cy);
            self.cells[idx].push(i as u16);
        }
    }

    /// Total particle indices stored across all cells.
    pub fn occupancy(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Particle;
    use crate::settings::SimSettings;

    fn unit_box() -> Bounds {
        Bounds::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 0.0))
    }

    #[test]
    fn test_hash_bounded_for_far_positions() {
        let bounds = unit_box();
        let grid_size = (8, 8);
        for p in [
            Vec3::new(-1e6, -1e6, 0.0),
            Vec3::new(1e6, 1e6, 0.0),
            Vec3::new(5.0, -500.0, 0.0),
            Vec3::new(10.0, 10.0, 0.0),
            Vec3::new(f32::MIN, f32::MAX, 0.0),
        ] {
            let (cx, cy) = pos_to_cell(p, &bounds, grid_size);
            assert!(cx < 8 && cy < 8, "cell ({}, {}) out of range for {:?}", cx, cy, p);
        }
    }

    #[test]
    fn test_corner_fill() {
        // Four particles, one per corner of a 2x2 grid over [0,10]^2.
        let bounds = unit_box();
        let mut particles = Particles { list: Vec::new() };
        for pos in [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(9.0, 9.0, 0.0),
            Vec3::new(0.0, 9.0, 0.0),
            Vec3::new(9.0, 0.0, 0.0),
        ] {
            particles.list.push(Particle::at_rest(pos, 0.1));
        }

        let mut grid = SpatialGrid::new((2, 2));
        grid.rebuild(&particles, &bounds);

        assert_eq!(grid.cell(0, 0), &[0]);
        assert_eq!(grid.cell(1, 1), &[1]);
        assert_eq!(grid.cell(0, 1), &[2]);
        assert_eq!(grid.cell(1, 0), &[3]);
        assert_eq!(grid.occupancy(), 4);
    }

    #[test]
    fn test_rebuild_keeps_ascending_order() {
        let settings = SimSettings {
            particle_count: 64,
            initial_spacing: 0.2,
            bounds: unit_box(),
            grid_size: (4, 4),
            ..Default::default()
        };
        let particles = Particles::spawn_lattice(&settings);
        let mut grid = SpatialGrid::new(settings.grid_size);
        grid.rebuild(&particles, &settings.bounds);

        assert_eq!(grid.occupancy(), 64);
        for cy in 0..grid.height {
            for cx in 0..grid.width {
                let cell = grid.cell(cx, cy);
                assert!(
                    cell.windows(2).all(|w| w[0] < w[1]),
                    "cell ({}, {}) not ascending: {:?}",
                    cx,
                    cy,
                    cell
                );
            }
        }
    }

    #[test]
    fn test_out_of_bounds_particles_hash_to_edge_cells() {
        let bounds = unit_box();
        let mut particles = Particles { list: Vec::new() };
        particles
            .list
            .push(Particle::at_rest(Vec3::new(-50.0, 5.0, 0.0), 0.1));
        particles
            .list
            .push(Particle::at_rest(Vec3::new(50.0, 5.0, 0.0), 0.1));

        let mut grid = SpatialGrid::new((4, 4));
        grid.rebuild(&particles, &bounds);

        // Every particle lands in exactly one cell even when out of bounds.
        assert_eq!(grid.occupancy(), 2);
        assert_eq!(grid.cell(0, 2), &[0]);
        assert_eq!(grid.cell(3, 2), &[1]);
    }
}
