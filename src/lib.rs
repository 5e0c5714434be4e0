pub mod error;
pub mod mask_loader;
pub mod mesh;
pub mod reconstruction;
pub mod settings;
pub mod structures;

pub use error::{ReconstructionError, Result};
pub use mesh::{LabeledPoint, Mesh, MeshVertex};
pub use reconstruction::{reconstruct, reconstruct_enabled};
