// 3D low-pass filter applied to the density grid before surface extraction.
// Only the scalar grid is filtered; colors travel through vertex interpolation.

use crate::mesh::voxel_grid::VoxelGrid;

/// Binomial 3x3x3 kernel, indexed `[dz][dy][dx]`
pub const BINOMIAL_KERNEL: [[[f32; 3]; 3]; 3] = [
    [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]],
    [[2.0, 4.0, 2.0], [4.0, 8.0, 4.0], [2.0, 4.0, 2.0]],
    [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]],
];

/// Sum of all kernel weights
pub const KERNEL_SUM: f32 = 64.0;

/// Blurs the grid in place, `iterations` times.
///
/// Interior voxels only: the outermost layer on every face keeps its original
/// value. Each pass reads a snapshot of the previous pass, so results do not
/// depend on visiting order. Grids thinner than 3 voxels on any axis have no
/// interior and are left untouched.
pub fn smooth_volume(grid: &mut VoxelGrid, iterations: u32) {
    let dims = grid.dims();
    if iterations == 0 || dims.width < 3 || dims.height < 3 || dims.depth < 3 {
        return;
    }

    let mut snapshot = grid.as_slice().to_vec();

    for _ in 0..iterations {
        let out = grid.as_mut_slice();

        for z in 1..dims.depth - 1 {
            for y in 1..dims.height - 1 {
                for x in 1..dims.width - 1 {
                    let mut sum = 0.0;
                    for (dz, plane) in BINOMIAL_KERNEL.iter().enumerate() {
                        for (dy, row) in plane.iter().enumerate() {
                            let base = dims.index(x - 1, y + dy - 1, z + dz - 1);
                            sum += snapshot[base] * row[0]
                                + snapshot[base + 1] * row[1]
                                + snapshot[base + 2] * row[2];
                        }
                    }
                    out[dims.index(x, y, z)] = sum / KERNEL_SUM;
                }
            }
        }

        snapshot.copy_from_slice(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::voxel_grid::GridDims;

    fn impulse(dims: GridDims, at: (usize, usize, usize)) -> VoxelGrid {
        let mut grid = VoxelGrid::new(dims);
        grid.set(at.0, at.1, at.2, 1.0);
        grid
    }

    #[test]
    fn test_kernel_sum_matches_weights() {
        let total: f32 = BINOMIAL_KERNEL.iter().flatten().flatten().sum();
        assert_eq!(total, KERNEL_SUM);
    }

    #[test]
    fn test_uniform_field_is_fixed_point() {
        let dims = GridDims::new(6, 5, 4);
        let mut grid = VoxelGrid::from_vec(dims, vec![0.7; dims.cell_count()]).unwrap();
        smooth_volume(&mut grid, 3);

        let mut interior_sum = 0.0;
        for z in 1..dims.depth - 1 {
            for y in 1..dims.height - 1 {
                for x in 1..dims.width - 1 {
                    interior_sum += grid.get(x, y, z);
                }
            }
        }
        let interior_count = (dims.width - 2) * (dims.height - 2) * (dims.depth - 2);

        assert!((interior_sum - 0.7 * interior_count as f32).abs() < 1e-3);
        for &value in grid.as_slice() {
            assert!((value - 0.7).abs() < 1e-5);
        }
    }

    #[test]
    fn test_impulse_spreads_with_kernel_weights() {
        let dims = GridDims::new(5, 5, 5);
        let mut grid = impulse(dims, (2, 2, 2));
        smooth_volume(&mut grid, 1);

        assert!((grid.get(2, 2, 2) - 8.0 / 64.0).abs() < 1e-7);
        assert!((grid.get(3, 2, 2) - 4.0 / 64.0).abs() < 1e-7);
        assert!((grid.get(3, 3, 2) - 2.0 / 64.0).abs() < 1e-7);
        assert!((grid.get(3, 3, 3) - 1.0 / 64.0).abs() < 1e-7);
        // Reads come from the snapshot, so mass is conserved away from the border
        let total: f32 = grid.as_slice().iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_boundary_layer_is_untouched() {
        let dims = GridDims::new(4, 4, 4);
        let mut grid = impulse(dims, (1, 1, 1));
        grid.set(0, 0, 0, 1.0);
        grid.set(3, 2, 1, 0.5);
        smooth_volume(&mut grid, 2);

        assert_eq!(grid.get(0, 0, 0), 1.0);
        assert_eq!(grid.get(3, 2, 1), 0.5);
        assert_eq!(grid.get(0, 3, 3), 0.0);
        assert!(grid.get(1, 1, 1) < 1.0);
    }

    #[test]
    fn test_zero_iterations_is_noop() {
        let dims = GridDims::new(5, 5, 5);
        let mut grid = impulse(dims, (2, 2, 2));
        let before = grid.clone();
        smooth_volume(&mut grid, 0);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_thin_grid_has_no_interior() {
        let dims = GridDims::new(8, 2, 8);
        let mut grid = impulse(dims, (3, 1, 3));
        let before = grid.clone();
        smooth_volume(&mut grid, 4);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_second_pass_reads_first_pass_result() {
        let dims = GridDims::new(7, 7, 7);
        let mut once_twice = impulse(dims, (3, 3, 3));
        smooth_volume(&mut once_twice, 1);
        smooth_volume(&mut once_twice, 1);

        let mut twice = impulse(dims, (3, 3, 3));
        smooth_volume(&mut twice, 2);

        assert_eq!(once_twice, twice);
    }
}
