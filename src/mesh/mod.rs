pub mod marching_cubes;
pub mod smoothing;
pub mod tables;
pub mod types;
pub mod voxel_grid;

// Re-export commonly used items
pub use marching_cubes::{marching_cubes, CornerOrder};
pub use smoothing::smooth_volume;
pub use types::{Bounds, LabeledPoint, Mesh, MeshVertex};
pub use voxel_grid::{
    CollisionPolicy, ColorGrid, GridDims, Volume, VolumeBuilder, VoxelGrid,
};
