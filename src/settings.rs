use crate::error::{ReconstructionError, Result};
use crate::mesh::{CollisionPolicy, CornerOrder, GridDims};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Parameters of one reconstruction pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionSettings {
    /// Corners strictly above this value count as inside
    pub iso_level: f32,
    pub smoothing_iterations: u32,
    pub corner_order: CornerOrder,
    pub collision_policy: CollisionPolicy,
    /// Fixed grid extent; `None` sizes the grid to the points
    pub grid_dims: Option<GridDims>,
}

impl Default for ReconstructionSettings {
    fn default() -> Self {
        Self::smoothed()
    }
}

impl ReconstructionSettings {
    /// Blurred density with a low threshold
    pub fn smoothed() -> Self {
        Self {
            iso_level: 0.4,
            smoothing_iterations: 1,
            corner_order: CornerOrder::default(),
            collision_policy: CollisionPolicy::default(),
            grid_dims: None,
        }
    }

    /// Raw `{0, 1}` occupancy with a threshold just under full
    pub fn binary() -> Self {
        Self {
            iso_level: 0.9,
            smoothing_iterations: 0,
            ..Self::smoothed()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.iso_level.is_finite() {
            return Err(ReconstructionError::InvalidSetting(format!(
                "iso_level must be finite, got {}",
                self.iso_level
            )));
        }
        if let Some(dims) = self.grid_dims {
            match dims.checked_cell_count() {
                Some(0) => {
                    return Err(ReconstructionError::InvalidSetting(format!(
                        "grid_dims must be non-zero on every axis, got {:?}",
                        dims
                    )))
                }
                None => {
                    return Err(ReconstructionError::InvalidSetting(format!(
                        "grid_dims {:?} hold more cells than fit in memory",
                        dims
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Where mask images live and how they are read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskStackSettings {
    pub root: PathBuf,
    /// Frames are numbered `1..=frame_count`; the number becomes z
    pub frame_count: u32,
    /// Gray values strictly above this are active
    pub threshold: u8,
}

impl Default for MaskStackSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("ImgsFormateo/salida_pngs"),
            frame_count: 136,
            threshold: 127,
        }
    }
}

impl MaskStackSettings {
    /// `<root>/<structure>_frame_<n>.png`
    pub fn frame_path(&self, structure: &str, frame: u32) -> PathBuf {
        self.root.join(format!("{}_frame_{}.png", structure, frame))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reconstruction: ReconstructionSettings,
    pub masks: MaskStackSettings,
}

impl Settings {
    /// Reads settings from a JSON file; a missing file gives defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.reconstruction.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
