// Mask stack loading: turns per-structure PNG slices into labeled points.
// Structures decode independently; slices within one structure are read in order.

use crate::error::Result;
use crate::mesh::LabeledPoint;
use crate::settings::MaskStackSettings;
use crate::structures::{EnabledStructures, Structure, StructureCatalog};
use image::GrayImage;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Decodes one mask image as 8-bit grayscale
pub fn read_mask(path: &Path) -> Result<GrayImage> {
    Ok(image::open(path)?.to_luma8())
}

/// Active pixels of one slice, placed at height `z`
pub fn points_from_mask(
    mask: &GrayImage,
    z: u32,
    threshold: u8,
    color: [f32; 3],
) -> impl Iterator<Item = LabeledPoint> + '_ {
    mask.enumerate_pixels()
        .filter(move |(_, _, pixel)| pixel.0[0] > threshold)
        .map(move |(x, y, _)| LabeledPoint::new(x as f32, y as f32, z as f32, color))
}

/// Reads every frame of one structure.
///
/// Missing frames are skipped; frames that fail to decode are skipped with a
/// warning. A structure with no readable frames yields no points.
pub fn load_structure(settings: &MaskStackSettings, structure: &Structure) -> Vec<LabeledPoint> {
    let mut points = Vec::new();
    let mut frames_read = 0u32;

    for frame in 1..=settings.frame_count {
        let path = settings.frame_path(&structure.name, frame);
        if !path.is_file() {
            debug!("No frame {} for {} at {}", frame, structure.name, path.display());
            continue;
        }

        let mask = match read_mask(&path) {
            Ok(mask) => mask,
            Err(e) => {
                warn!("Skipping unreadable mask {}: {}", path.display(), e);
                continue;
            }
        };

        frames_read += 1;
        points.extend(points_from_mask(&mask, frame, settings.threshold, structure.color));
    }

    info!(
        "Loaded {}: {} points from {} frames",
        structure.name,
        points.len(),
        frames_read
    );
    points
}

/// Per-structure point lists, loaded once and reused across reconstructions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructurePoints {
    per_structure: Vec<Vec<LabeledPoint>>,
}

impl StructurePoints {
    /// Entry `i` holds the points of catalog entry `i`
    pub fn new(per_structure: Vec<Vec<LabeledPoint>>) -> Self {
        Self { per_structure }
    }

    /// Loads every catalog entry, one structure per worker
    pub fn load(settings: &MaskStackSettings, catalog: &StructureCatalog) -> Self {
        let structures: Vec<&Structure> = catalog.iter().collect();
        let per_structure = structures
            .par_iter()
            .map(|structure| load_structure(settings, structure))
            .collect();

        Self { per_structure }
    }

    pub fn structure_count(&self) -> usize {
        self.per_structure.len()
    }

    pub fn points_of(&self, index: usize) -> &[LabeledPoint] {
        self.per_structure
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_points(&self) -> usize {
        self.per_structure.iter().map(Vec::len).sum()
    }

    /// Enabled structures' points concatenated in catalog order
    pub fn enabled_points(&self, enabled: &EnabledStructures) -> Vec<LabeledPoint> {
        let count = enabled
            .enabled_indices()
            .map(|i| self.points_of(i).len())
            .sum();
        let mut merged = Vec::with_capacity(count);
        for index in enabled.enabled_indices() {
            merged.extend_from_slice(self.points_of(index));
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_points_from_mask_threshold_is_strict() {
        let mask = GrayImage::from_fn(3, 2, |x, y| match (x, y) {
            (0, 0) => Luma([127]),
            (1, 0) => Luma([128]),
            (2, 1) => Luma([255]),
            _ => Luma([0]),
        });
        let points: Vec<LabeledPoint> = points_from_mask(&mask, 5, 127, [0.2, 0.4, 0.6]).collect();

        assert_eq!(
            points,
            vec![
                LabeledPoint::new(1.0, 0.0, 5.0, [0.2, 0.4, 0.6]),
                LabeledPoint::new(2.0, 1.0, 5.0, [0.2, 0.4, 0.6]),
            ]
        );
    }

    #[test]
    fn test_read_mask_reports_decode_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken_frame_1.png");
        std::fs::write(&path, b"\x89PNG truncated").unwrap();

        assert!(matches!(
            read_mask(&path),
            Err(crate::error::ReconstructionError::Image(_))
        ));
    }

    #[test]
    fn test_read_mask_converts_to_gray() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heartMasks_frame_1.png");
        GrayImage::from_fn(4, 2, |x, _| Luma([x as u8 * 60])).save(&path).unwrap();

        let mask = read_mask(&path).unwrap();
        assert_eq!(mask.dimensions(), (4, 2));
        assert_eq!(mask.get_pixel(3, 1).0, [180]);
    }

    #[test]
    fn test_enabled_points_follow_catalog_order() {
        let a = LabeledPoint::new(0.0, 0.0, 0.0, [1.0, 0.0, 0.0]);
        let b = LabeledPoint::new(1.0, 0.0, 0.0, [0.0, 1.0, 0.0]);
        let c = LabeledPoint::new(2.0, 0.0, 0.0, [0.0, 0.0, 1.0]);
        let cache = StructurePoints::new(vec![vec![a], vec![b], vec![c]]);

        let mut enabled = EnabledStructures::none(3);
        enabled.set(2, true);
        enabled.set(0, true);

        assert_eq!(cache.enabled_points(&enabled), vec![a, c]);
        assert_eq!(cache.total_points(), 3);
        assert!(cache.points_of(7).is_empty());
    }
}
