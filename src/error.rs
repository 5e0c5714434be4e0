//! Error types for settings, mask loading and volume assembly

use crate::mesh::voxel_grid::GridDims;
use thiserror::Error;

/// Result type for reconstruction operations
pub type Result<T> = std::result::Result<T, ReconstructionError>;

/// Errors raised at the edges of the pipeline.
///
/// The reconstruction stages themselves never fail; these come from settings
/// files, catalog lookups and externally assembled volumes.
#[derive(Error, Debug)]
pub enum ReconstructionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    /// Density and color grids must be co-indexed
    #[error("Grid dimension mismatch: density {density:?}, colors {colors:?}")]
    DimensionMismatch { density: GridDims, colors: GridDims },

    /// Grid buffer length disagrees with its dimensions
    #[error("Grid buffer holds {actual} cells, dimensions {dims:?} need {expected}")]
    BufferLength {
        dims: GridDims,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Unknown structure: {0}")]
    UnknownStructure(String),
}
