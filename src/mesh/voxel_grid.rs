use crate::error::{ReconstructionError, Result};
use crate::mesh::types::LabeledPoint;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Largest extent a grid derived from points may have on any axis
pub const MAX_DERIVED_AXIS: usize = 1 << 14;

/// Extent of a dense grid along x (width), y (height) and z (depth).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl GridDims {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Smallest extent covering every point, or 1x1x1 when there are none.
    ///
    /// Points at or beyond `MAX_DERIVED_AXIS` on any axis are ignored; the
    /// builder later drops them as out of range.
    pub fn covering(points: &[LabeledPoint]) -> Self {
        let mut dims = Self::new(1, 1, 1);
        let in_limit = |v: &[usize; 3]| v.iter().all(|&c| c < MAX_DERIVED_AXIS);
        for [x, y, z] in points.iter().filter_map(LabeledPoint::voxel).filter(in_limit) {
            dims.width = dims.width.max(x + 1);
            dims.height = dims.height.max(y + 1);
            dims.depth = dims.depth.max(z + 1);
        }
        dims
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// Cell count, or `None` when it does not fit in `usize`
    pub fn checked_cell_count(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)
            .and_then(|area| area.checked_mul(self.depth))
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.width && y < self.height && z < self.depth
    }

    /// Flat offset of `(x, y, z)`: `z * H * W + y * W + x`
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.height + y) * self.width + x
    }
}

/// Dense 3D array stored as one flat buffer, indexed `[z][y][x]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid3<T> {
    dims: GridDims,
    data: Vec<T>,
}

impl<T: Copy + Default> Grid3<T> {
    /// Creates a grid with every cell at `T::default()`
    pub fn new(dims: GridDims) -> Self {
        Self {
            dims,
            data: vec![T::default(); dims.cell_count()],
        }
    }
}

impl<T: Copy> Grid3<T> {
    pub fn from_vec(dims: GridDims, data: Vec<T>) -> Result<Self> {
        let expected = dims.cell_count();
        if data.len() != expected {
            return Err(ReconstructionError::BufferLength {
                dims,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { dims, data })
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> T {
        self.data[self.dims.index(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) {
        let idx = self.dims.index(x, y, z);
        self.data[idx] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

/// Scalar occupancy grid, binary `{0, 1}` or smoothed `[0, 1]`
pub type VoxelGrid = Grid3<f32>;

/// Per-voxel RGB, black where no point landed
pub type ColorGrid = Grid3<Vec3>;

/// Co-indexed density and color grids
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    density: VoxelGrid,
    colors: ColorGrid,
}

impl Volume {
    pub fn empty(dims: GridDims) -> Self {
        Self {
            density: VoxelGrid::new(dims),
            colors: ColorGrid::new(dims),
        }
    }

    /// Pairs externally built grids; their dimensions must agree
    pub fn from_parts(density: VoxelGrid, colors: ColorGrid) -> Result<Self> {
        if density.dims() != colors.dims() {
            return Err(ReconstructionError::DimensionMismatch {
                density: density.dims(),
                colors: colors.dims(),
            });
        }
        Ok(Self { density, colors })
    }

    pub fn dims(&self) -> GridDims {
        self.density.dims()
    }

    pub fn density(&self) -> &VoxelGrid {
        &self.density
    }

    /// Mutable density access; the shape cannot change so co-indexing holds
    pub fn density_mut(&mut self) -> &mut VoxelGrid {
        &mut self.density
    }

    pub fn colors(&self) -> &ColorGrid {
        &self.colors
    }
}

/// What happens when several points land in the same voxel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The last point written decides the voxel color
    #[default]
    LastWriteWins,
    /// The voxel color is the mean of every point written to it
    Blend,
}

/// Rasterizes labeled points into a binary density grid and a color grid.
#[derive(Debug, Clone, Default)]
pub struct VolumeBuilder {
    dims: Option<GridDims>,
    collision: CollisionPolicy,
}

impl VolumeBuilder {
    /// Builder that sizes the grid to the points' bounding box
    pub fn new() -> Self {
        Self::default()
    }

    /// Use fixed dimensions; points outside them are dropped
    pub fn with_dims(mut self, dims: GridDims) -> Self {
        self.dims = Some(dims);
        self
    }

    pub fn with_collision_policy(mut self, collision: CollisionPolicy) -> Self {
        self.collision = collision;
        self
    }

    pub fn build(&self, points: &[LabeledPoint]) -> Volume {
        let dims = self.dims.unwrap_or_else(|| GridDims::covering(points));
        let mut volume = Volume::empty(dims);
        let mut hits = match self.collision {
            CollisionPolicy::Blend => vec![0u32; dims.cell_count()],
            CollisionPolicy::LastWriteWins => Vec::new(),
        };
        let mut dropped = 0usize;

        for point in points {
            let Some([x, y, z]) = point.voxel().filter(|&[x, y, z]| dims.contains(x, y, z))
            else {
                dropped += 1;
                continue;
            };

            let idx = dims.index(x, y, z);
            let color = Vec3::from(point.color);
            volume.density.data[idx] = 1.0;
            volume.colors.data[idx] = match self.collision {
                CollisionPolicy::LastWriteWins => color,
                CollisionPolicy::Blend => {
                    hits[idx] += 1;
                    let previous = volume.colors.data[idx];
                    previous + (color - previous) / hits[idx] as f32
                }
            };
        }

        if dropped > 0 {
            warn!(
                "Dropped {} of {} points outside the {}x{}x{} grid",
                dropped,
                points.len(),
                dims.width,
                dims.height,
                dims.depth
            );
        }

        volume
    }
}
