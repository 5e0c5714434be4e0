// One reconstruction pass: points -> volume -> (smoothing) -> Marching Cubes -> normals.
// Every call starts from scratch; nothing from a previous run is reused.

use crate::mask_loader::StructurePoints;
use crate::mesh::{marching_cubes, smooth_volume, LabeledPoint, Mesh, VolumeBuilder};
use crate::settings::ReconstructionSettings;
use crate::structures::EnabledStructures;
use std::time::Instant;
use tracing::info;

/// Builds the colored surface mesh for a point set
pub fn reconstruct(points: &[LabeledPoint], settings: &ReconstructionSettings) -> Mesh {
    let start = Instant::now();

    let mut builder = VolumeBuilder::new().with_collision_policy(settings.collision_policy);
    if let Some(dims) = settings.grid_dims {
        builder = builder.with_dims(dims);
    }
    let mut volume = builder.build(points);
    let dims = volume.dims();

    smooth_volume(volume.density_mut(), settings.smoothing_iterations);

    let mut mesh = marching_cubes(&volume, settings.iso_level, settings.corner_order);
    mesh.calculate_normals();

    info!(
        "Reconstructed {} points on a {}x{}x{} grid: {} vertices, {} triangles in {:?}",
        points.len(),
        dims.width,
        dims.height,
        dims.depth,
        mesh.vertex_count(),
        mesh.triangle_count(),
        start.elapsed()
    );

    mesh
}

/// Reconstructs only the enabled structures from the loaded point cache
pub fn reconstruct_enabled(
    cache: &StructurePoints,
    enabled: &EnabledStructures,
    settings: &ReconstructionSettings,
) -> Mesh {
    let points = cache.enabled_points(enabled);
    info!(
        "{} of {} structures enabled, {} points",
        enabled.enabled_count(),
        cache.structure_count(),
        points.len()
    );
    reconstruct(&points, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{CornerOrder, GridDims};

    fn solid_block(origin: usize, size: usize, color: [f32; 3]) -> Vec<LabeledPoint> {
        let mut points = Vec::new();
        for z in origin..origin + size {
            for y in origin..origin + size {
                for x in origin..origin + size {
                    points.push(LabeledPoint::new(x as f32, y as f32, z as f32, color));
                }
            }
        }
        points
    }

    #[test]
    fn test_empty_points_give_empty_mesh() {
        for settings in [ReconstructionSettings::smoothed(), ReconstructionSettings::binary()] {
            let mesh = reconstruct(&[], &settings);
            assert!(mesh.is_empty());
            assert_eq!(mesh.vertex_count(), 0);
        }
    }

    #[test]
    fn test_normals_are_unit_for_non_degenerate_triangles() {
        let points = solid_block(2, 3, [0.9, 0.7, 0.5]);
        let settings = ReconstructionSettings {
            corner_order: CornerOrder::Cyclic,
            grid_dims: Some(GridDims::new(8, 8, 8)),
            ..ReconstructionSettings::smoothed()
        };
        let mesh = reconstruct(&points, &settings);
        assert!(!mesh.is_empty());

        for tri in mesh.indices.chunks_exact(3) {
            let p = |i: u32| glam::Vec3::from(mesh.vertices[i as usize].position);
            let area = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0])).length();
            for &i in tri {
                let n = glam::Vec3::from(mesh.vertices[i as usize].normal);
                assert!(n.is_finite());
                if area > 1e-6 {
                    assert!((n.length() - 1.0).abs() < 1e-4);
                }
            }
        }
    }

    #[test]
    fn test_fixed_dims_drop_points_without_failing() {
        let mut points = solid_block(1, 2, [1.0, 0.0, 0.0]);
        points.push(LabeledPoint::new(40.0, 40.0, 40.0, [0.0, 1.0, 0.0]));
        let settings = ReconstructionSettings {
            grid_dims: Some(GridDims::new(5, 5, 5)),
            ..ReconstructionSettings::binary()
        };
        let mesh = reconstruct(&points, &settings);

        assert!(!mesh.is_empty());
        let bounds = mesh.bounds().unwrap();
        assert!(bounds.max.iter().all(|&c| c <= 4.0));
    }
}
