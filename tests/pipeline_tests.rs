//! End-to-end reconstruction tests
//!
//! Two structures are modelled as solid 4x4x4 blocks of points in separate
//! corners of the grid and pushed through the whole pipeline.

use glam::Vec3;
use slicemesh::mask_loader::StructurePoints;
use slicemesh::mesh::{marching_cubes, CornerOrder, GridDims, LabeledPoint, VolumeBuilder};
use slicemesh::reconstruction::{reconstruct, reconstruct_enabled};
use slicemesh::settings::ReconstructionSettings;
use slicemesh::structures::{EnabledStructures, Structure, StructureCatalog};

const HEART: [f32; 3] = [1.0, 0.3, 0.3];
const LUNG: [f32; 3] = [0.6, 0.9, 0.9];

fn block(origin: usize, color: [f32; 3]) -> Vec<LabeledPoint> {
    let mut points = Vec::new();
    for z in origin..origin + 4 {
        for y in origin..origin + 4 {
            for x in origin..origin + 4 {
                points.push(LabeledPoint::new(x as f32, y as f32, z as f32, color));
            }
        }
    }
    points
}

fn two_structures() -> (StructureCatalog, StructurePoints) {
    let catalog = StructureCatalog::new(vec![
        Structure::new("heartMasks", HEART),
        Structure::new("lungMasks", LUNG),
    ]);
    let cache = StructurePoints::new(vec![block(1, HEART), block(8, LUNG)]);
    (catalog, cache)
}

fn in_box(p: Vec3, min: f32, max: f32) -> bool {
    p.cmpge(Vec3::splat(min)).all() && p.cmple(Vec3::splat(max)).all()
}

// ============================================================================
// Volume building
// ============================================================================

#[test]
fn test_two_structures_make_two_colored_regions() {
    let (catalog, cache) = two_structures();
    let points = cache.enabled_points(&catalog.all_enabled());
    let volume = VolumeBuilder::new().build(&points);

    assert_eq!(volume.dims(), GridDims::new(12, 12, 12));

    let mut heart = 0;
    let mut lung = 0;
    for z in 0..12 {
        for y in 0..12 {
            for x in 0..12 {
                let value = volume.density().get(x, y, z);
                let color = volume.colors().get(x, y, z);
                let in_heart = (1..5).contains(&x) && (1..5).contains(&y) && (1..5).contains(&z);
                let in_lung = (8..12).contains(&x) && (8..12).contains(&y) && (8..12).contains(&z);

                if in_heart {
                    heart += 1;
                    assert_eq!(value, 1.0);
                    assert_eq!(color, Vec3::from(HEART));
                } else if in_lung {
                    lung += 1;
                    assert_eq!(value, 1.0);
                    assert_eq!(color, Vec3::from(LUNG));
                } else {
                    assert_eq!(value, 0.0);
                    assert_eq!(color, Vec3::ZERO);
                }
            }
        }
    }
    assert_eq!((heart, lung), (64, 64));
}

// ============================================================================
// Surface extraction
// ============================================================================

#[test]
fn test_two_structures_make_separate_surfaces() {
    let (catalog, cache) = two_structures();
    let points = cache.enabled_points(&catalog.all_enabled());
    let volume = VolumeBuilder::new().build(&points);

    for order in [CornerOrder::Binary, CornerOrder::Cyclic] {
        let mesh = marching_cubes(&volume, 0.4, order);
        assert!(!mesh.is_empty());
        assert_eq!(mesh.vertex_count(), mesh.indices.len());

        let mut heart_vertices = 0;
        let mut lung_vertices = 0;
        for vertex in &mesh.vertices {
            let position = Vec3::from(vertex.position);
            let color = Vec3::from(vertex.color);

            // Each crossing mixes one structure voxel with black background
            // at the iso level's weight
            if in_box(position, 0.0, 5.0) {
                heart_vertices += 1;
                assert!((color - 0.4 * Vec3::from(HEART)).length() < 1e-5, "{:?}", color);
            } else if in_box(position, 7.0, 11.0) {
                lung_vertices += 1;
                assert!((color - 0.4 * Vec3::from(LUNG)).length() < 1e-5, "{:?}", color);
            } else {
                panic!("vertex {:?} belongs to neither structure", position);
            }
        }
        assert!(heart_vertices > 0);
        assert!(lung_vertices > 0);
    }
}

#[test]
fn test_full_pipeline_normals() {
    let (catalog, cache) = two_structures();
    let settings = ReconstructionSettings::smoothed();
    let mesh = reconstruct_enabled(&cache, &catalog.all_enabled(), &settings);

    assert!(!mesh.is_empty());
    assert_eq!(mesh.indices.len() % 3, 0);
    for tri in mesh.indices.chunks_exact(3) {
        let p: Vec<Vec3> = tri
            .iter()
            .map(|&i| Vec3::from(mesh.vertices[i as usize].position))
            .collect();
        let area = (p[1] - p[0]).cross(p[2] - p[0]).length();
        for &i in tri {
            let normal = Vec3::from(mesh.vertices[i as usize].normal);
            assert!(normal.is_finite());
            if area > 1e-6 {
                assert!((normal.length() - 1.0).abs() < 1e-4);
            }
        }
    }
}

// ============================================================================
// Enabled structure selection
// ============================================================================

#[test]
fn test_disabling_structure_matches_never_loaded() {
    let (catalog, cache) = two_structures();
    let settings = ReconstructionSettings::smoothed();

    // A run with everything on must not leak into the next one
    let all = reconstruct_enabled(&cache, &catalog.all_enabled(), &settings);

    let mut heart_only = catalog.all_enabled();
    heart_only.toggle(1);
    let filtered = reconstruct_enabled(&cache, &heart_only, &settings);

    let fresh = reconstruct(&block(1, HEART), &settings);
    assert_eq!(filtered, fresh);
    assert!(filtered.triangle_count() < all.triangle_count());
}

#[test]
fn test_nothing_enabled_gives_empty_mesh() {
    let (catalog, cache) = two_structures();
    let none = EnabledStructures::none(catalog.len());
    let mesh = reconstruct_enabled(&cache, &none, &ReconstructionSettings::smoothed());
    assert!(mesh.is_empty());
    assert!(mesh.bounds().is_none());
}

#[test]
fn test_repeated_runs_are_identical() {
    let (catalog, cache) = two_structures();
    let settings = ReconstructionSettings::binary();
    let enabled = catalog.all_enabled();

    let first = reconstruct_enabled(&cache, &enabled, &settings);
    let second = reconstruct_enabled(&cache, &enabled, &settings);
    assert_eq!(first, second);
}
