// Catalog of segmented structures and the per-run selection of which ones
// take part in a reconstruction.

use crate::error::{ReconstructionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// One segmented structure: its mask-file stem and display color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub name: String,
    pub color: [f32; 3],
}

impl Structure {
    pub fn new(name: impl Into<String>, color: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

const ANATOMICAL: [(&str, [f32; 3]); 17] = [
    ("bloodMasks", [0.95, 0.3, 0.5]),
    ("BrainMasks", [0.8, 0.9, 1.0]),
    ("duodenumMasks", [1.0, 0.8, 0.6]),
    ("eyeMasks", [1.0, 1.0, 1.0]),
    ("eyeRetnaMasks", [1.0, 0.6, 0.8]),
    ("eyeWhiteMasks", [0.95, 0.95, 0.95]),
    ("heartMasks", [1.0, 0.3, 0.3]),
    ("ileumMasks", [0.9, 0.75, 0.6]),
    ("kidneyMasks", [0.7, 0.4, 0.5]),
    ("lIntestineMasks", [0.6, 0.8, 1.0]),
    ("liverMasks", [1.0, 0.6, 0.7]),
    ("lungMasks", [0.6, 0.9, 0.9]),
    ("muscleMasks", [0.9, 0.7, 0.5]),
    ("nerveMasks", [0.9, 0.85, 0.5]),
    ("skeletonMasks", [0.96, 0.92, 0.85]),
    ("spleenMasks", [0.85, 0.4, 0.5]),
    ("stomachMasks", [1.0, 0.5, 0.3]),
];

/// Ordered list of structures; the order fixes how points are merged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureCatalog {
    structures: Vec<Structure>,
}

impl Default for StructureCatalog {
    fn default() -> Self {
        Self::anatomical()
    }
}

impl StructureCatalog {
    pub fn new(structures: Vec<Structure>) -> Self {
        Self { structures }
    }

    /// The seventeen anatomical mask stacks with their display colors
    pub fn anatomical() -> Self {
        Self::new(
            ANATOMICAL
                .iter()
                .map(|&(name, color)| Structure::new(name, color))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Structure> {
        self.structures.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Structure> {
        self.structures.iter()
    }

    /// Index of a structure by name, ignoring ASCII case
    pub fn position(&self, name: &str) -> Result<usize> {
        self.structures
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ReconstructionError::UnknownStructure(name.to_string()))
    }

    /// Everything on
    pub fn all_enabled(&self) -> EnabledStructures {
        EnabledStructures {
            flags: vec![true; self.len()],
        }
    }
}

/// Which catalog entries feed the next reconstruction.
///
/// Passed by reference into each run; nothing is remembered between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledStructures {
    flags: Vec<bool>,
}

impl EnabledStructures {
    /// Everything off
    pub fn none(count: usize) -> Self {
        Self {
            flags: vec![false; count],
        }
    }

    pub fn is_enabled(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    pub fn set(&mut self, index: usize, enabled: bool) {
        if let Some(flag) = self.flags.get_mut(index) {
            *flag = enabled;
        }
    }

    /// Flip one entry, returning its new state
    pub fn toggle(&mut self, index: usize) -> bool {
        match self.flags.get_mut(index) {
            Some(flag) => {
                *flag = !*flag;
                *flag
            }
            None => false,
        }
    }

    pub fn enabled_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| on.then_some(i))
    }

    pub fn enabled_count(&self) -> usize {
        self.flags.iter().filter(|&&on| on).count()
    }

    /// Disable the named structures
    pub fn disable_named(&mut self, catalog: &StructureCatalog, names: &[String]) -> Result<()> {
        for name in names {
            self.set(catalog.position(name)?, false);
        }
        Ok(())
    }

    /// Keep only the named structures enabled
    pub fn enable_only(catalog: &StructureCatalog, names: &[String]) -> Result<Self> {
        let mut enabled = Self::none(catalog.len());
        for name in names {
            enabled.set(catalog.position(name)?, true);
        }
        Ok(enabled)
    }

    /// One `[key] name: ON/OFF` line per structure, keys `1`-`9` then `a`-`z`
    pub fn status_report(&self, catalog: &StructureCatalog) -> String {
        let mut report = String::new();
        for (i, structure) in catalog.iter().enumerate() {
            let key = menu_key(i);
            let state = if self.is_enabled(i) { "ON" } else { "OFF" };
            let _ = writeln!(report, "[{}] {}: {}", key, structure.name, state);
        }
        report
    }
}

/// `1`-`9`, then `a`-`z`, then `?` for anything past the last letter
fn menu_key(index: usize) -> char {
    match index {
        0..=8 => char::from(b'1' + index as u8),
        9..=34 => char::from(b'a' + (index - 9) as u8),
        _ => '?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anatomical_catalog() {
        let catalog = StructureCatalog::anatomical();
        assert_eq!(catalog.len(), 17);
        assert_eq!(catalog.get(6).unwrap().name, "heartMasks");
        assert_eq!(catalog.get(6).unwrap().color, [1.0, 0.3, 0.3]);
        for structure in catalog.iter() {
            assert!(structure.color.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn test_menu_keys_stop_after_z() {
        assert_eq!(menu_key(0), '1');
        assert_eq!(menu_key(8), '9');
        assert_eq!(menu_key(9), 'a');
        assert_eq!(menu_key(16), 'h');
        assert_eq!(menu_key(34), 'z');
        assert_eq!(menu_key(35), '?');
        assert_eq!(menu_key(1000), '?');
    }

    #[test]
    fn test_position_is_case_insensitive() {
        let catalog = StructureCatalog::anatomical();
        assert_eq!(catalog.position("brainmasks").unwrap(), 1);
        assert!(matches!(
            catalog.position("tailMasks"),
            Err(ReconstructionError::UnknownStructure(_))
        ));
    }

    #[test]
    fn test_toggle_and_enabled_indices() {
        let catalog = StructureCatalog::anatomical();
        let mut enabled = catalog.all_enabled();
        assert_eq!(enabled.enabled_count(), 17);

        assert!(!enabled.toggle(0));
        assert!(!enabled.toggle(16));
        assert!(enabled.toggle(16));
        assert!(!enabled.toggle(99));

        let indices: Vec<usize> = enabled.enabled_indices().collect();
        assert_eq!(indices.len(), 16);
        assert_eq!(indices[0], 1);
        assert!(!enabled.is_enabled(99));
    }

    #[test]
    fn test_enable_only_and_disable_named() {
        let catalog = StructureCatalog::anatomical();
        let names = vec!["heartMasks".to_string(), "lungMasks".to_string()];

        let only = EnabledStructures::enable_only(&catalog, &names).unwrap();
        assert_eq!(only.enabled_indices().collect::<Vec<_>>(), vec![6, 11]);

        let mut most = catalog.all_enabled();
        most.disable_named(&catalog, &names).unwrap();
        assert_eq!(most.enabled_count(), 15);
        assert!(!most.is_enabled(6));

        let bad = vec!["nope".to_string()];
        assert!(EnabledStructures::enable_only(&catalog, &bad).is_err());
    }

    #[test]
    fn test_status_report_keys() {
        let catalog = StructureCatalog::anatomical();
        let mut enabled = catalog.all_enabled();
        enabled.set(9, false);
        let report = enabled.status_report(&catalog);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 17);
        assert_eq!(lines[0], "[1] bloodMasks: ON");
        assert_eq!(lines[9], "[a] lIntestineMasks: OFF");
        assert_eq!(lines[16], "[h] stomachMasks: ON");
    }
}
